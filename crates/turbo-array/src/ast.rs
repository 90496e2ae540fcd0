//! Expression syntax tree and the builtin function table.

use std::collections::BTreeSet;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    /// Looks up an infix operator by its source symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "^" => BinaryOp::Pow,
            ">" => BinaryOp::Gt,
            "<" => BinaryOp::Lt,
            ">=" => BinaryOp::Ge,
            "<=" => BinaryOp::Le,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            _ => return None,
        };
        Some(op)
    }

    /// Applies the operator. Comparisons yield `1.0` or `0.0`.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Sub => left - right,
            BinaryOp::Mul => left * right,
            BinaryOp::Div => left / right,
            BinaryOp::Pow => left.powf(right),
            BinaryOp::Gt => truth(left > right),
            BinaryOp::Lt => truth(left < right),
            BinaryOp::Ge => truth(left >= right),
            BinaryOp::Le => truth(left <= right),
            BinaryOp::Eq => truth(left == right),
            BinaryOp::Ne => truth(left != right),
        }
    }
}

/// Numeric truth value.
pub fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// A native function callable from expressions. Arity is fixed and checked
/// by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Log,
    Exp,
    Pow,
    Min,
    Max,
}

/// Every builtin, in lookup order.
pub const BUILTINS: [Builtin; 12] = [
    Builtin::Sin,
    Builtin::Cos,
    Builtin::Tan,
    Builtin::Sqrt,
    Builtin::Abs,
    Builtin::Floor,
    Builtin::Ceil,
    Builtin::Log,
    Builtin::Exp,
    Builtin::Pow,
    Builtin::Min,
    Builtin::Max,
];

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        BUILTINS.iter().copied().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Log => "log",
            Builtin::Exp => "exp",
            Builtin::Pow => "pow",
            Builtin::Min => "min",
            Builtin::Max => "max",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Pow | Builtin::Min | Builtin::Max => 2,
            _ => 1,
        }
    }

    /// Calls the function. Returns NaN when `args.len()` differs from
    /// [`Builtin::arity`]; the evaluator rejects such calls before getting here.
    pub fn call(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Builtin::Sin, [a]) => a.sin(),
            (Builtin::Cos, [a]) => a.cos(),
            (Builtin::Tan, [a]) => a.tan(),
            (Builtin::Sqrt, [a]) => a.sqrt(),
            (Builtin::Abs, [a]) => a.abs(),
            (Builtin::Floor, [a]) => a.floor(),
            (Builtin::Ceil, [a]) => a.ceil(),
            (Builtin::Log, [a]) => a.ln(),
            (Builtin::Exp, [a]) => a.exp(),
            (Builtin::Pow, [a, b]) => a.powf(*b),
            (Builtin::Min, [a, b]) => nan_min(*a, *b),
            (Builtin::Max, [a, b]) => nan_max(*a, *b),
            _ => f64::NAN,
        }
    }
}

// `f64::min`/`max` drop NaN operands; these propagate them instead.
pub(crate) fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

pub(crate) fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// A parsed expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(f64),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        func: Builtin,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Node::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Names of all variables referenced by the tree, sorted.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Node::Literal(_) => {}
            Node::Variable(name) => {
                out.insert(name.as_str());
            }
            Node::Unary { operand, .. } => operand.collect_variables(out),
            Node::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Node::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(Builtin::lookup("sqrt"), Some(Builtin::Sqrt));
        assert_eq!(Builtin::lookup("pow").map(Builtin::arity), Some(2));
        assert_eq!(Builtin::lookup("hypot"), None);
        for b in BUILTINS {
            assert_eq!(Builtin::lookup(b.name()), Some(b));
        }
    }

    #[test]
    fn test_min_max_propagate_nan() {
        assert!(Builtin::Min.call(&[f64::NAN, 1.0]).is_nan());
        assert!(Builtin::Max.call(&[1.0, f64::NAN]).is_nan());
        assert_eq!(Builtin::Max.call(&[1.0, 3.0]), 3.0);
        assert!(Builtin::Sin.call(&[1.0, 2.0]).is_nan());
    }

    #[test]
    fn test_variables() {
        let node = Node::binary(
            BinaryOp::Add,
            Node::Variable("x".into()),
            Node::Call {
                func: Builtin::Max,
                args: vec![Node::Variable("acc".into()), Node::Literal(1.0)],
            },
        );
        let vars: Vec<&str> = node.variables().into_iter().collect();
        assert_eq!(vars, vec!["acc", "x"]);
    }
}
