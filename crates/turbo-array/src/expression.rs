//! Compiled expressions.
//!
//! An [`Expression`] is the source text together with its parsed tree. It is
//! immutable once built and can be evaluated any number of times, from any
//! number of threads.

use crate::ast::Node;
use crate::error::{Error, Result};
use crate::eval::{evaluate, Env, EvalError};
use crate::lexer::tokenize;
use crate::parser::parse;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Node,
}

impl Expression {
    /// Tokenizes and parses `source`.
    pub fn compile(source: &str) -> Result<Self> {
        let tokens = tokenize(source).map_err(|source_err| Error::Lex {
            expr: source.to_string(),
            source: source_err,
        })?;
        let root = parse(&tokens).map_err(|source_err| Error::Parse {
            expr: source.to_string(),
            source: source_err,
        })?;
        Ok(Expression {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Evaluates against `env`.
    pub fn eval(&self, env: &Env) -> Result<f64> {
        evaluate(&self.root, env).map_err(|source| Error::Eval {
            expr: self.source.clone(),
            source,
        })
    }

    /// Fails with an unbound-variable error if the expression references a
    /// name outside `allowed`.
    pub fn check_variables(&self, allowed: &[&str]) -> Result<()> {
        match self
            .root
            .variables()
            .into_iter()
            .find(|name| !allowed.contains(name))
        {
            Some(name) => Err(Error::Eval {
                expr: self.source.clone(),
                source: EvalError::UnboundVariable(name.to_string()),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
