//! Syntax tree for filter expressions.
//!
//! Interior nodes record their height so the parser can bound it without
//! walking the tree. Evaluation, cloning and dropping all recurse, and the
//! bound keeps that recursion shallow.

/// A constant operand, or the result of evaluating a subexpression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Operand>),
}

impl Operand {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Operand::Nil => "nil",
            Operand::Bool(_) => "bool",
            Operand::Int(_) => "int",
            Operand::Float(_) => "float",
            Operand::Str(_) => "string",
            Operand::Array(_) => "array",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

/// Short-circuiting operators. Chains of one operator share a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    Or,
    And,
}

/// Binary operators, listed loosest binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// A compiled expression node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    /// Literal value, including arrays whose elements are all literals.
    Literal(Operand),
    /// Reference to a context attribute.
    Variable(String),
    /// Array with at least one non-constant element.
    Array { items: Vec<Expr>, height: usize },
    /// Two or more terms joined by the same logical operator.
    Logical {
        op: LogicalOp,
        terms: Vec<Expr>,
        height: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        height: usize,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        height: usize,
    },
}

fn tallest(children: &[Expr]) -> usize {
    children.iter().map(Expr::height).max().unwrap_or(0)
}

impl Expr {
    pub(crate) fn array(items: Vec<Expr>) -> Self {
        let height = tallest(&items) + 1;
        Expr::Array { items, height }
    }

    pub(crate) fn logical(op: LogicalOp, terms: Vec<Expr>) -> Self {
        let height = tallest(&terms) + 1;
        Expr::Logical { op, terms, height }
    }

    pub(crate) fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            height: operand.height() + 1,
            operand: Box::new(operand),
        }
    }

    pub(crate) fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            height: lhs.height().max(rhs.height()) + 1,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Number of nodes on the longest path from this node to a leaf.
    pub(crate) fn height(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Variable(_) => 1,
            Expr::Array { height, .. }
            | Expr::Logical { height, .. }
            | Expr::Unary { height, .. }
            | Expr::Binary { height, .. } => *height,
        }
    }

    /// Collects every variable name referenced by this expression.
    pub(crate) fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Array { items: children, .. } | Expr::Logical { terms: children, .. } => {
                for child in children {
                    child.collect_variables(out);
                }
            }
            Expr::Unary { operand, .. } => operand.collect_variables(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }
}
