//! Recursive-descent expression parser.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! comparison     := additive (("<" | ">" | "<=" | ">=" | "==" | "!=") additive)*
//! additive       := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := power (("*" | "/") power)*
//! power          := unary ("^" power)?
//! unary          := ("-" | "!") unary | primary
//! primary        := number | identifier | function "(" args? ")" | "(" comparison ")"
//! ```
//!
//! Unary operators bind tighter than `^`, so `-2^2` is `4`.
//!
//! The evaluator and `Drop` walk the tree recursively, so the parser bounds
//! both its own recursion ([`MAX_DEPTH`]) and the height of the tree it
//! builds ([`MAX_HEIGHT`]). Operator chains are parsed with loops.

use crate::ast::{BinaryOp, Builtin, Node, UnaryOp};
use crate::lexer::{Operator, Token, TokenKind};
use thiserror::Error;

/// Nesting limit for parentheses and prefix operators.
pub const MAX_DEPTH: usize = 256;

/// Height limit for the syntax tree. `x + x + ... + x` grows by one level per `+`.
pub const MAX_HEIGHT: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected {expected} at position {position}, found '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        position: usize,
    },
    #[error("Expected {expected} at position {position}, found end of input")]
    UnexpectedEnd {
        expected: &'static str,
        position: usize,
    },
    #[error("Unclosed '(' at position {position}")]
    UnclosedParen { position: usize },
    #[error("Unmatched ')' at position {position}")]
    UnmatchedParen { position: usize },
    #[error("Unknown function '{name}' at position {position}")]
    UnknownFunction { name: String, position: usize },
    #[error("Function '{name}' expects {expected} argument(s), got {found} at position {position}")]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
        position: usize,
    },
    #[error("Expression nested too deeply at position {position}")]
    TooDeep { position: usize },
}

impl ParseError {
    /// Byte offset the error points at.
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEnd { position, .. }
            | ParseError::UnclosedParen { position }
            | ParseError::UnmatchedParen { position }
            | ParseError::UnknownFunction { position, .. }
            | ParseError::ArityMismatch { position, .. }
            | ParseError::TooDeep { position } => *position,
        }
    }
}

/// Parses a token sequence into a syntax tree.
pub fn parse(tokens: &[Token]) -> Result<Node, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let tree = parser.comparison()?;
    match parser.peek() {
        None => Ok(tree.node),
        Some(token) if token.kind == TokenKind::RParen => Err(ParseError::UnmatchedParen {
            position: token.offset,
        }),
        Some(token) => Err(ParseError::UnexpectedToken {
            expected: "operator or end of input",
            found: token.kind.to_string(),
            position: token.offset,
        }),
    }
}

/// A node together with its height (a leaf has height 1).
struct Subtree {
    node: Node,
    height: usize,
}

impl Subtree {
    fn leaf(node: Node) -> Self {
        Subtree { node, height: 1 }
    }

    /// Wraps `node` as a parent of children whose tallest has `child_height`.
    fn parent(node: Node, child_height: usize, position: usize) -> Result<Self, ParseError> {
        let height = child_height + 1;
        if height > MAX_HEIGHT {
            return Err(ParseError::TooDeep { position });
        }
        Ok(Subtree { node, height })
    }

    fn binary(
        op: BinaryOp,
        left: Subtree,
        right: Subtree,
        position: usize,
    ) -> Result<Self, ParseError> {
        let child_height = left.height.max(right.height);
        Subtree::parent(Node::binary(op, left.node, right.node), child_height, position)
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_position(&self) -> usize {
        self.tokens.last().map(Token::end).unwrap_or(0)
    }

    fn position(&self) -> usize {
        self.peek().map(|t| t.offset).unwrap_or(self.end_position())
    }

    fn peek_operator(&self) -> Option<Operator> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Operator(op),
                ..
            }) => Some(*op),
            _ => None,
        }
    }

    fn comparison(&mut self) -> Result<Subtree, ParseError> {
        let mut left = self.additive()?;
        while let Some(op) = self.peek_operator().and_then(comparison_op) {
            let position = self.position();
            self.pos += 1;
            let right = self.additive()?;
            left = Subtree::binary(op, left, right, position)?;
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Subtree, ParseError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek_operator() {
                Some(Operator::Plus) => BinaryOp::Add,
                Some(Operator::Minus) => BinaryOp::Sub,
                _ => break,
            };
            let position = self.position();
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Subtree::binary(op, left, right, position)?;
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Subtree, ParseError> {
        let mut left = self.power()?;
        loop {
            let op = match self.peek_operator() {
                Some(Operator::Star) => BinaryOp::Mul,
                Some(Operator::Slash) => BinaryOp::Div,
                _ => break,
            };
            let position = self.position();
            self.pos += 1;
            let right = self.power()?;
            left = Subtree::binary(op, left, right, position)?;
        }
        Ok(left)
    }

    fn power(&mut self) -> Result<Subtree, ParseError> {
        let base = self.unary()?;
        let mut exponents = Vec::new();
        while self.peek_operator() == Some(Operator::Caret) {
            let position = self.position();
            if exponents.len() >= MAX_HEIGHT {
                return Err(ParseError::TooDeep { position });
            }
            self.pos += 1;
            exponents.push((position, self.unary()?));
        }

        // Right-associative: `a ^ b ^ c` is `a ^ (b ^ c)`.
        let mut tail: Option<(usize, Subtree)> = None;
        while let Some((position, operand)) = exponents.pop() {
            tail = Some(match tail {
                None => (position, operand),
                Some((inner, right)) => (
                    position,
                    Subtree::binary(BinaryOp::Pow, operand, right, inner)?,
                ),
            });
        }
        match tail {
            None => Ok(base),
            Some((position, exponent)) => Subtree::binary(BinaryOp::Pow, base, exponent, position),
        }
    }

    fn unary(&mut self) -> Result<Subtree, ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                position: self.position(),
            });
        }
        let op = match self.peek_operator() {
            Some(Operator::Minus) => Some(UnaryOp::Neg),
            Some(Operator::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        let tree = match op {
            Some(op) => {
                let position = self.position();
                self.pos += 1;
                self.unary().and_then(|operand| {
                    Subtree::parent(Node::unary(op, operand.node), operand.height, position)
                })
            }
            None => self.primary(),
        };
        self.depth -= 1;
        tree
    }

    fn primary(&mut self) -> Result<Subtree, ParseError> {
        let token = self.advance().ok_or(ParseError::UnexpectedEnd {
            expected: "expression",
            position: self.end_position(),
        })?;
        match &token.kind {
            TokenKind::Number(n) => Ok(Subtree::leaf(Node::Literal(*n))),
            TokenKind::Identifier(name) => Ok(Subtree::leaf(Node::Variable(name.clone()))),
            TokenKind::Function(name) => self.call(name, token.offset),
            TokenKind::LParen => {
                let inner = self.comparison()?;
                self.close_paren(token.offset)?;
                Ok(inner)
            }
            other => Err(ParseError::UnexpectedToken {
                expected: "expression",
                found: other.to_string(),
                position: token.offset,
            }),
        }
    }

    fn call(&mut self, name: &str, position: usize) -> Result<Subtree, ParseError> {
        let func = Builtin::lookup(name).ok_or_else(|| ParseError::UnknownFunction {
            name: name.to_string(),
            position,
        })?;
        // The lexer only emits `Function` when a `(` follows.
        let open = match self.advance() {
            Some(t) if t.kind == TokenKind::LParen => t.offset,
            _ => {
                return Err(ParseError::UnexpectedEnd {
                    expected: "'('",
                    position: self.end_position(),
                })
            }
        };

        let mut args = Vec::new();
        let mut child_height = 0;
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::RParen) {
            self.pos += 1;
        } else {
            loop {
                let arg = self.comparison()?;
                child_height = child_height.max(arg.height);
                args.push(arg.node);
                match self.advance() {
                    Some(t) if t.kind == TokenKind::Comma => continue,
                    Some(t) if t.kind == TokenKind::RParen => break,
                    Some(t) => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "',' or ')'",
                            found: t.kind.to_string(),
                            position: t.offset,
                        })
                    }
                    None => return Err(ParseError::UnclosedParen { position: open }),
                }
            }
        }

        if args.len() != func.arity() {
            return Err(ParseError::ArityMismatch {
                name: func.name(),
                expected: func.arity(),
                found: args.len(),
                position,
            });
        }
        Subtree::parent(Node::Call { func, args }, child_height, position)
    }

    fn close_paren(&mut self, open: usize) -> Result<(), ParseError> {
        match self.advance() {
            Some(t) if t.kind == TokenKind::RParen => Ok(()),
            Some(t) => Err(ParseError::UnexpectedToken {
                expected: "')'",
                found: t.kind.to_string(),
                position: t.offset,
            }),
            None => Err(ParseError::UnclosedParen { position: open }),
        }
    }
}

fn comparison_op(op: Operator) -> Option<BinaryOp> {
    match op {
        Operator::Gt => Some(BinaryOp::Gt),
        Operator::Lt => Some(BinaryOp::Lt),
        Operator::Ge => Some(BinaryOp::Ge),
        Operator::Le => Some(BinaryOp::Le),
        Operator::Eq => Some(BinaryOp::Eq),
        Operator::Ne => Some(BinaryOp::Ne),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_str(source: &str) -> Result<Node, ParseError> {
        parse(&tokenize(source).unwrap())
    }

    fn var(name: &str) -> Node {
        Node::Variable(name.into())
    }

    #[test]
    fn test_precedence() {
        let node = parse_str("2 + 3 * 4").unwrap();
        assert_eq!(
            node,
            Node::binary(
                BinaryOp::Add,
                Node::Literal(2.0),
                Node::binary(BinaryOp::Mul, Node::Literal(3.0), Node::Literal(4.0)),
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let node = parse_str("2^3^2").unwrap();
        assert_eq!(
            node,
            Node::binary(
                BinaryOp::Pow,
                Node::Literal(2.0),
                Node::binary(BinaryOp::Pow, Node::Literal(3.0), Node::Literal(2.0)),
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let node = parse_str("x - 1 - 2").unwrap();
        assert_eq!(
            node,
            Node::binary(
                BinaryOp::Sub,
                Node::binary(BinaryOp::Sub, var("x"), Node::Literal(1.0)),
                Node::Literal(2.0),
            )
        );
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        let node = parse_str("-x^2").unwrap();
        assert_eq!(
            node,
            Node::binary(
                BinaryOp::Pow,
                Node::unary(UnaryOp::Neg, var("x")),
                Node::Literal(2.0),
            )
        );
        assert!(parse_str("2^-1").is_ok());
        assert!(parse_str("!!x").is_ok());
    }

    #[test]
    fn test_comparison_is_lowest() {
        let node = parse_str("x + 1 > 2 * x").unwrap();
        assert!(matches!(
            node,
            Node::Binary {
                op: BinaryOp::Gt,
                ..
            }
        ));
    }

    #[test]
    fn test_function_calls() {
        let node = parse_str("max(x, pow(2, 3))").unwrap();
        assert_eq!(
            node,
            Node::Call {
                func: Builtin::Max,
                args: vec![
                    var("x"),
                    Node::Call {
                        func: Builtin::Pow,
                        args: vec![Node::Literal(2.0), Node::Literal(3.0)],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_unclosed_paren() {
        assert_eq!(
            parse_str("(x + 1"),
            Err(ParseError::UnclosedParen { position: 0 })
        );
        assert_eq!(
            parse_str("sqrt(x"),
            Err(ParseError::UnclosedParen { position: 4 })
        );
    }

    #[test]
    fn test_unmatched_paren() {
        assert_eq!(
            parse_str("x + 1)"),
            Err(ParseError::UnmatchedParen { position: 5 })
        );
    }

    #[test]
    fn test_missing_operand() {
        assert_eq!(
            parse_str("x +"),
            Err(ParseError::UnexpectedEnd {
                expected: "expression",
                position: 3
            })
        );
        assert!(matches!(
            parse_str("* 2"),
            Err(ParseError::UnexpectedToken { position: 0, .. })
        ));
        assert!(matches!(
            parse_str(""),
            Err(ParseError::UnexpectedEnd { position: 0, .. })
        ));
    }

    #[test]
    fn test_juxtaposition_rejected() {
        assert!(matches!(
            parse_str("2 x"),
            Err(ParseError::UnexpectedToken { position: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            parse_str("x + hypot(x, 1)"),
            Err(ParseError::UnknownFunction {
                name: "hypot".into(),
                position: 4
            })
        );
    }

    #[test]
    fn test_arity_mismatch() {
        assert_eq!(
            parse_str("sin(x, 1)"),
            Err(ParseError::ArityMismatch {
                name: "sin",
                expected: 1,
                found: 2,
                position: 0
            })
        );
        assert!(matches!(
            parse_str("pow(2)"),
            Err(ParseError::ArityMismatch { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            parse_str("cos()"),
            Err(ParseError::ArityMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}x{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(matches!(parse_str(&deep), Err(ParseError::TooDeep { .. })));
        let ok = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse_str(&ok), Ok(var("x")));
    }

    #[test]
    fn test_long_operator_chains_rejected() {
        for op in ["+", "-", "*", "/", ">", "=="] {
            let source = format!("x{}", format!("{op}x").repeat(200_000));
            assert!(
                matches!(parse_str(&source), Err(ParseError::TooDeep { .. })),
                "{op}"
            );
        }
        let source = format!("1{}", "^1".repeat(200_000));
        assert!(matches!(parse_str(&source), Err(ParseError::TooDeep { .. })));
        let source = format!("{}x", "-".repeat(200_000));
        assert!(matches!(parse_str(&source), Err(ParseError::TooDeep { .. })));
    }

    #[test]
    fn test_height_limit_boundary() {
        // `MAX_HEIGHT - 1` additions give a tree of exactly `MAX_HEIGHT` levels.
        let at_limit = format!("x{}", "+x".repeat(MAX_HEIGHT - 1));
        assert!(parse_str(&at_limit).is_ok());
        let over = format!("x{}", "+x".repeat(MAX_HEIGHT));
        assert_eq!(
            parse_str(&over),
            Err(ParseError::TooDeep {
                position: 1 + 2 * (MAX_HEIGHT - 1)
            })
        );
    }

    #[test]
    fn test_power_chain_still_right_associative() {
        let node = parse_str("2^3^4").unwrap();
        assert_eq!(
            node,
            Node::binary(
                BinaryOp::Pow,
                Node::Literal(2.0),
                Node::binary(BinaryOp::Pow, Node::Literal(3.0), Node::Literal(4.0)),
            )
        );
        assert!(parse_str(&format!("2{}", "^1".repeat(500))).is_ok());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let source = "sin(x) + cos(x^2) + sqrt(abs(x))";
        assert_eq!(parse_str(source).unwrap(), parse_str(source).unwrap());
    }
}
