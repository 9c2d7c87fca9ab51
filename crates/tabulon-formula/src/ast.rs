//! Formula AST

use rust_decimal::Decimal;

/// A parsed formula expression.
///
/// Cell and range references are not stored inline; `Ref` holds an index
/// into the ordered reference list of the surrounding [`ParsedFormula`],
/// so the document can resolve and track each reference exactly once.
///
/// [`ParsedFormula`]: crate::parser::ParsedFormula
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Decimal),
    Str(String),
    Bool(bool),
    /// Index into the formula's reference list
    Ref(usize),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }

    /// Binding strength, higher binds tighter. `^` is right-associative,
    /// everything else is left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Eq | BinaryOp::Ne => 1,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div => 4,
            BinaryOp::Pow => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
        }
    }
}

/// One end of a reference as written in the formula source: an optional
/// sheet qualifier and an upper-cased cell name with its `$` anchors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefText {
    pub sheet: Option<String>,
    pub cell: String,
}

/// A cell or range reference collected during parsing, in source order.
/// `to` is present for range references (`A1:B2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub from: RefText,
    pub to: Option<RefText>,
}
