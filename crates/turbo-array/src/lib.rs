//! Numeric array transformation engine.
//!
//! # Overview
//!
//! Operations are described by small records: either a structured
//! `{op, value}` pair or a free-form expression such as
//! `"sin(x) + cos(x^2) + sqrt(abs(x))"`. The [`Engine`] resolves a record
//! into a closure once and applies it element-wise (`map`, `filter`, `find`),
//! as a fold (`reduce`), as a key (`group_by`, `sort_by`), or as a stage of a
//! `chain`.
//!
//! # Example
//!
//! ```
//! use turbo_array::{ChainOperation, Engine, Operation};
//!
//! let engine = Engine::default();
//!
//! let squares = engine.map(&[1.0, 2.0, 3.0], &Operation::expr("x * x")).unwrap();
//! assert_eq!(squares, vec![1.0, 4.0, 9.0]);
//!
//! let result = engine
//!     .chain(
//!         &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
//!         &[
//!             ChainOperation::filter(Operation::expr("x > 2")),
//!             ChainOperation::map(Operation::expr("x * 2")),
//!             ChainOperation::sort(Operation::symbol("desc")),
//!         ],
//!     )
//!     .unwrap();
//! assert_eq!(result, vec![12.0, 10.0, 8.0, 6.0]);
//! ```

pub mod ast;
pub mod descriptor;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod eval;
pub mod expression;
pub mod helpers;
pub mod lexer;
pub mod parser;
pub mod pipeline;

// Re-export the core public API
pub use ast::{BinaryOp, Builtin, Node, UnaryOp};
pub use descriptor::{ChainOperation, Descriptor, Operation, StageKind};
pub use dispatch::{BinaryFn, SortKey, SortOrder, UnaryFn};
pub use engine::{Engine, EngineOptions};
pub use error::{Error, ErrorKind, Result};
pub use eval::{evaluate, Env, EvalError};
pub use expression::Expression;
pub use helpers::range;
pub use lexer::{tokenize, LexError, Token, TokenKind};
pub use parser::{parse, ParseError};
pub use pipeline::{group_key, AggregateResult, Groups, Metric, Summary, NOT_FOUND};
