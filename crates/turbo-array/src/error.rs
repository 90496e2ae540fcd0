use crate::eval::EvalError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use thiserror::Error;

/// Coarse error category, for adapters that report a kind alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Eval,
    UnsupportedOperation,
    DescriptorShape,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Lex error in \"{expr}\": {source}")]
    Lex {
        expr: String,
        #[source]
        source: LexError,
    },

    #[error("Parse error in \"{expr}\": {source}")]
    Parse {
        expr: String,
        #[source]
        source: ParseError,
    },

    #[error("Evaluation error in \"{expr}\": {source}")]
    Eval {
        expr: String,
        #[source]
        source: EvalError,
    },

    #[error("Unsupported operation: \"{0}\"")]
    UnsupportedOperation(String),

    #[error("Invalid descriptor: {0}")]
    DescriptorShape(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Lex { .. } => ErrorKind::Lex,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Eval { .. } => ErrorKind::Eval,
            Error::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Error::DescriptorShape(_) => ErrorKind::DescriptorShape,
        }
    }

    /// The expression source the error was raised for, if any.
    pub fn expression(&self) -> Option<&str> {
        match self {
            Error::Lex { expr, .. } | Error::Parse { expr, .. } | Error::Eval { expr, .. } => {
                Some(expr)
            }
            _ => None,
        }
    }

    /// The part of the expression starting at the error position.
    pub fn offending_fragment(&self) -> Option<&str> {
        let (expr, position) = match self {
            Error::Lex { expr, source } => (expr, source.offset),
            Error::Parse { expr, source } => (expr, source.position()),
            _ => return None,
        };
        expr.get(position..)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
