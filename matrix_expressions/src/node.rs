use ndarray::Array2;

use crate::shape::Shape;

/// Handle to a node inside an [`ExprGraph`](crate::ExprGraph).
///
/// Carries the id of the owning graph so that handles cannot silently be used with another one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId {
    pub(crate) graph: u32,
    pub(crate) index: u32,
}

impl ExprId {
    /// Position of the node in its graph's arena.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Operator tag of a node. Operands live in [`Node::args`]; the target shape of a reshape is
/// the node's own shape.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Symbol { name: String },
    Constant(Array2<f64>),
    Add,
    Sub,
    /// Elementwise product.
    Mul,
    Neg,
    Scale(f64),
    /// Matrix product.
    MatMul,
    Transpose,
    Reshape,
    Vertcat,
    Horzcat,
    /// Resolved row and column positions, in selection order. `single` records which axes were
    /// selected by one index rather than a range.
    Slice {
        rows: Vec<usize>,
        cols: Vec<usize>,
        single: (bool, bool),
    },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Symbol { .. } => "symbol",
            Op::Constant(_) => "constant",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Neg => "neg",
            Op::Scale(_) => "scale",
            Op::MatMul => "mtimes",
            Op::Transpose => "transpose",
            Op::Reshape => "reshape",
            Op::Vertcat => "vertcat",
            Op::Horzcat => "horzcat",
            Op::Slice { .. } => "slice",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Op::Symbol { .. } | Op::Constant(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub op: Op,
    pub args: Vec<ExprId>,
    pub shape: Shape,
}
