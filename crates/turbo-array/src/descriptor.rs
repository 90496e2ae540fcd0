//! Operation descriptors as they arrive from callers.
//!
//! [`Operation`] is the loosely-typed record (`{op, value, field, expr}`);
//! [`Operation::descriptor`] normalizes it into the tagged [`Descriptor`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Operation record. Unknown fields are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operator symbol: `+ - * / ^`, `> < >= <= == !=`, `sqrt`, `abs`, `asc`, `desc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    /// Right-hand operand for `op`. Defaults to `0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Field passthrough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Expression over `x` (and `acc` when reducing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
}

impl Operation {
    pub fn expr(source: impl Into<String>) -> Self {
        Operation {
            expr: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn op(symbol: impl Into<String>, value: f64) -> Self {
        Operation {
            op: Some(symbol.into()),
            value: Some(value),
            ..Default::default()
        }
    }

    /// An `op` with no operand, e.g. `{op: "+"}` for reducing or `{op: "desc"}` for sorting.
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Operation {
            op: Some(symbol.into()),
            ..Default::default()
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Operation {
            field: Some(name.into()),
            ..Default::default()
        }
    }

    /// Normalizes the record. A non-empty `expr` wins over `op`, which wins
    /// over `field`.
    pub fn descriptor(&self) -> Result<Descriptor> {
        if let Some(expr) = non_empty(&self.expr) {
            return Ok(Descriptor::Expr(expr.to_string()));
        }
        if let Some(symbol) = non_empty(&self.op) {
            return Ok(Descriptor::Op {
                symbol: symbol.to_string(),
                value: self.value.unwrap_or(0.0),
            });
        }
        if let Some(field) = non_empty(&self.field) {
            return Ok(Descriptor::Field(field.to_string()));
        }
        Err(Error::DescriptorShape(
            "operation must set one of \"expr\", \"op\" or \"field\"".to_string(),
        ))
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

/// A normalized operation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Expr(String),
    Op { symbol: String, value: f64 },
    Field(String),
}

/// Kind of a chained pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Map,
    Filter,
    Sort,
}

impl StageKind {
    /// Name of the field a stage of this kind reads its descriptor from.
    pub fn operand_field(self) -> &'static str {
        match self {
            StageKind::Map => "operation",
            StageKind::Filter => "condition",
            StageKind::Sort => "comparator",
        }
    }
}

/// One stage of a `chain` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainOperation {
    #[serde(rename = "type")]
    pub kind: StageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<Operation>,
}

impl ChainOperation {
    pub fn map(operation: Operation) -> Self {
        ChainOperation {
            kind: StageKind::Map,
            operation: Some(operation),
            condition: None,
            comparator: None,
        }
    }

    pub fn filter(condition: Operation) -> Self {
        ChainOperation {
            kind: StageKind::Filter,
            operation: None,
            condition: Some(condition),
            comparator: None,
        }
    }

    pub fn sort(comparator: Operation) -> Self {
        ChainOperation {
            kind: StageKind::Sort,
            operation: None,
            condition: None,
            comparator: Some(comparator),
        }
    }

    /// The descriptor this stage's kind requires.
    pub fn stage_operation(&self) -> Result<&Operation> {
        let operation = match self.kind {
            StageKind::Map => self.operation.as_ref(),
            StageKind::Filter => self.condition.as_ref(),
            StageKind::Sort => self.comparator.as_ref(),
        };
        operation.ok_or_else(|| {
            Error::DescriptorShape(format!(
                "{:?} stage requires \"{}\"",
                self.kind,
                self.kind.operand_field()
            ))
        })
    }
}
