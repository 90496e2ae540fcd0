//! Operation dispatch: descriptor in, closure out.
//!
//! This is the only place that branches on descriptor shape. Everything
//! downstream sees a [`UnaryFn`], a [`BinaryFn`] or a [`SortKey`].

use crate::ast::{truth, BinaryOp};
use crate::descriptor::{Descriptor, Operation};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::eval::Env;
use log::trace;
use std::cmp::Ordering;

/// `f(x)`, applied per element.
pub type UnaryFn = Box<dyn Fn(f64) -> Result<f64> + Send + Sync>;

/// `f(acc, x)`, applied per element while folding.
pub type BinaryFn = Box<dyn Fn(f64, f64) -> Result<f64> + Send + Sync>;

/// Natural numeric order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Numeric comparison with NaN ordered after every number in both directions.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                match self {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            }
        }
    }
}

/// How `sortBy` and `sort` stages order elements.
pub enum SortKey {
    /// Sort by the element values themselves.
    Natural(SortOrder),
    /// Sort ascending by a per-element key.
    Key(UnaryFn),
}

impl Engine {
    /// Resolves a descriptor into `f(x)`.
    pub fn resolve_unary(&self, operation: &Operation) -> Result<UnaryFn> {
        let descriptor = operation.descriptor()?;
        trace!("resolving unary {descriptor:?}");
        match descriptor {
            Descriptor::Expr(source) => {
                let expr = self.compile(&source)?;
                expr.check_variables(&["x"])?;
                Ok(Box::new(move |x: f64| expr.eval(&Env::element(x))))
            }
            Descriptor::Op { symbol, value } => self.unary_op(&symbol, value),
            Descriptor::Field(_) => Ok(Box::new(|x: f64| Ok(x))),
        }
    }

    /// Resolves a descriptor into `f(acc, x)`.
    pub fn resolve_binary(&self, operation: &Operation) -> Result<BinaryFn> {
        let descriptor = operation.descriptor()?;
        trace!("resolving binary {descriptor:?}");
        match descriptor {
            Descriptor::Expr(source) => {
                let expr = self.compile(&source)?;
                expr.check_variables(&["acc", "x"])?;
                Ok(Box::new(move |acc: f64, x: f64| {
                    expr.eval(&Env::fold(acc, x))
                }))
            }
            Descriptor::Op { symbol, .. } => self.binary_op(&symbol),
            Descriptor::Field(_) => Ok(Box::new(|_: f64, x: f64| Ok(x))),
        }
    }

    /// Resolves a sort comparator. `{op: "asc"}` and `{op: "desc"}` select
    /// natural order; anything else is used as an ascending sort key.
    pub fn resolve_sort(&self, comparator: &Operation) -> Result<SortKey> {
        if let Descriptor::Op { symbol, .. } = comparator.descriptor()? {
            match symbol.as_str() {
                "asc" => return Ok(SortKey::Natural(SortOrder::Asc)),
                "desc" => return Ok(SortKey::Natural(SortOrder::Desc)),
                _ => {}
            }
        }
        self.resolve_unary(comparator).map(SortKey::Key)
    }

    fn unary_op(&self, symbol: &str, value: f64) -> Result<UnaryFn> {
        let epsilon = self.options().equality_epsilon;
        let f: UnaryFn = match symbol {
            "==" => Box::new(move |x: f64| Ok(truth((x - value).abs() < epsilon))),
            "!=" => Box::new(move |x: f64| Ok(truth(!((x - value).abs() < epsilon)))),
            "sqrt" => Box::new(|x: f64| Ok(x.sqrt())),
            "abs" => Box::new(|x: f64| Ok(x.abs())),
            _ => match BinaryOp::from_symbol(symbol) {
                Some(op) => Box::new(move |x: f64| Ok(op.apply(x, value))),
                None => return Err(Error::UnsupportedOperation(symbol.to_string())),
            },
        };
        Ok(f)
    }

    fn binary_op(&self, symbol: &str) -> Result<BinaryFn> {
        let epsilon = self.options().equality_epsilon;
        let f: BinaryFn = match symbol {
            "==" => Box::new(move |acc: f64, x: f64| Ok(truth((acc - x).abs() < epsilon))),
            "!=" => Box::new(move |acc: f64, x: f64| Ok(truth(!((acc - x).abs() < epsilon)))),
            _ => match BinaryOp::from_symbol(symbol) {
                Some(op) => Box::new(move |acc: f64, x: f64| Ok(op.apply(acc, x))),
                None => return Err(Error::UnsupportedOperation(symbol.to_string())),
            },
        };
        Ok(f)
    }
}
