#![deny(unsafe_op_in_unsafe_fn)]

pub mod builder;
pub mod compile;
pub mod error;
pub mod evaluate;
pub mod evaluate_derivative;
pub mod function;
pub mod graph;
pub mod index;
pub mod kernels;
pub mod node;
pub mod node_utils;
pub mod shape;
pub mod strings;
pub mod traits;
pub mod utils;

pub use {ndarray, num_traits};

pub use crate::compile::{CompileOptions, EvalPlan, Instr, InstrKind, compile_plan};
pub use crate::error::{BindingMismatch, ExprError, IndexAxis, Result};
pub use crate::evaluate::{EvalContext, EvalOptions, eval_plan_into, evaluate};
pub use crate::evaluate_derivative::{DiffContext, Sensitivities, eval_forward_into, eval_jacobian, eval_reverse_into};
pub use crate::function::Function;
pub use crate::graph::ExprGraph;
pub use crate::index::Index;
pub use crate::node::{ExprId, Node, Op};
pub use crate::node_utils::{
    count_nodes, count_tree_nodes, depends_on, depth, free_symbols, topological_order, tree_mapreduce,
};
pub use crate::shape::Shape;
pub use crate::strings::{DisplayExpr, string_expr};
pub use crate::traits::Scalar;
