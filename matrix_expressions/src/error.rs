use core::fmt;

use thiserror::Error;

use crate::shape::Shape;

pub type Result<T, E = ExprError> = std::result::Result<T, E>;

/// Which extent an index was resolved against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexAxis {
    Row,
    Col,
    /// Column-major position over all elements.
    Linear,
}

impl fmt::Display for IndexAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexAxis::Row => "row",
            IndexAxis::Col => "column",
            IndexAxis::Linear => "linear",
        })
    }
}

/// A concrete value handed to a [`Function`](crate::Function) does not fit its signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingMismatch {
    #[error("expected {expected} {what} values, got {got}")]
    Count {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{what} {index} has shape {got}, expected {expected}")]
    Shape {
        what: &'static str,
        index: usize,
        expected: Shape,
        got: Shape,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("shape mismatch in {op}: {lhs} vs {rhs}")]
    ShapeMismatch { op: &'static str, lhs: Shape, rhs: Shape },

    #[error("cannot reshape {from} into {to}: element counts differ")]
    ElementCountMismatch { from: Shape, to: Shape },

    #[error("{axis} index {index} out of range for extent {dim}")]
    IndexOutOfRange { axis: IndexAxis, index: isize, dim: usize },

    #[error("{axis} slice step must be non-zero")]
    ZeroStep { axis: IndexAxis },

    #[error("expression belongs to a different graph")]
    ForeignExpression,

    #[error("function input {position} is not a symbol")]
    NotASymbol { position: usize },

    #[error("symbol '{name}' is listed more than once among the function inputs")]
    DuplicateInput { name: String },

    #[error("symbol '{name}' is used by an output but is not a function input")]
    UnboundSymbol { name: String },

    #[error("invalid binding: {0}")]
    InvalidBinding(#[from] BindingMismatch),

    #[error("{what} {index} out of range, function has {count}")]
    PortOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    #[error("output {output} contains non-finite values")]
    NonFinite { output: usize },
}
