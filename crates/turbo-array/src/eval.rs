//! Tree-walking evaluator.
//!
//! Arithmetic anomalies follow IEEE-754: `1/0` is infinity, `sqrt(-1)` is NaN.
//! Parsed trees only fail on a reference to a variable with no binding.

use crate::ast::{truth, Node, UnaryOp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unbound variable '{0}'")]
    UnboundVariable(String),
    /// Only reachable for trees built by hand; the parser checks arity.
    #[error("Function '{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Variable bindings for one evaluation.
///
/// `x` and `acc` have fixed slots so the per-element environments built by
/// the pipeline never allocate. Other names go to a small list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    x: Option<f64>,
    acc: Option<f64>,
    named: Vec<(String, f64)>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Environment with `x` bound to `x`.
    pub fn element(x: f64) -> Self {
        Env {
            x: Some(x),
            ..Env::default()
        }
    }

    /// Environment with `acc` and `x` bound.
    pub fn fold(acc: f64, x: f64) -> Self {
        Env {
            x: Some(x),
            acc: Some(acc),
            named: Vec::new(),
        }
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Binds `name`, replacing any previous binding.
    pub fn set(&mut self, name: &str, value: f64) {
        match name {
            "x" => self.x = Some(value),
            "acc" => self.acc = Some(value),
            _ => match self.named.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value,
                None => self.named.push((name.to_string(), value)),
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "x" => self.x,
            "acc" => self.acc,
            _ => self
                .named
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| *v),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Evaluates `node` against `env`. Operands are evaluated left to right.
pub fn evaluate(node: &Node, env: &Env) -> Result<f64, EvalError> {
    match node {
        Node::Literal(value) => Ok(*value),
        Node::Variable(name) => env
            .get(name)
            .ok_or_else(|| EvalError::UnboundVariable(name.clone())),
        Node::Unary { op, operand } => {
            let value = evaluate(operand, env)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Not => truth(value == 0.0),
            })
        }
        Node::Binary { op, left, right } => {
            let l = evaluate(left, env)?;
            let r = evaluate(right, env)?;
            Ok(op.apply(l, r))
        }
        Node::Call { func, args } => {
            if args.len() != func.arity() {
                return Err(EvalError::ArityMismatch {
                    name: func.name(),
                    expected: func.arity(),
                    found: args.len(),
                });
            }
            let mut values = [0.0f64; 2];
            for (slot, arg) in values.iter_mut().zip(args) {
                *slot = evaluate(arg, env)?;
            }
            Ok(func.call(&values[..args.len()]))
        }
    }
}
