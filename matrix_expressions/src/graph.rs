use std::sync::atomic::{AtomicU32, Ordering};

use ndarray::Array2;

use crate::error::{ExprError, Result};
use crate::node::{ExprId, Node, Op};
use crate::shape::Shape;

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(0);

/// Arena owning every expression node.
///
/// Nodes are appended and never modified or removed, so an [`ExprId`] stays valid for the
/// lifetime of the graph and operands always precede their users.
#[derive(Clone, Debug)]
pub struct ExprGraph {
    id: u32,
    nodes: Vec<Node>,
}

impl Default for ExprGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprGraph {
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn owns(&self, id: ExprId) -> bool {
        id.graph == self.id && id.index() < self.nodes.len()
    }

    pub fn node(&self, id: ExprId) -> Result<&Node> {
        if !self.owns(id) {
            return Err(ExprError::ForeignExpression);
        }
        Ok(&self.nodes[id.index()])
    }

    pub fn shape(&self, id: ExprId) -> Result<Shape> {
        Ok(self.node(id)?.shape)
    }

    pub fn rows(&self, id: ExprId) -> Result<usize> {
        Ok(self.shape(id)?.rows)
    }

    pub fn cols(&self, id: ExprId) -> Result<usize> {
        Ok(self.shape(id)?.cols)
    }

    /// Name of `id` if it is a symbol.
    pub fn symbol_name(&self, id: ExprId) -> Option<&str> {
        match &self.node(id).ok()?.op {
            Op::Symbol { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_symbol(&self, id: ExprId) -> bool {
        self.symbol_name(id).is_some()
    }

    /// Iterate over `(id, node)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &Node)> + '_ {
        let graph = self.id;
        self.nodes.iter().enumerate().map(move |(i, n)| {
            (
                ExprId {
                    graph,
                    index: i as u32,
                },
                n,
            )
        })
    }

    pub(crate) fn push(&mut self, op: Op, args: Vec<ExprId>, shape: Shape) -> ExprId {
        debug_assert!(args.iter().all(|a| self.owns(*a)));
        let index = u32::try_from(self.nodes.len()).unwrap_or_else(|_| panic!("expression graph exceeds u32::MAX nodes"));
        self.nodes.push(Node { op, args, shape });
        ExprId { graph: self.id, index }
    }

    /// Create a named matrix-valued input of fixed shape. The name is only used for printing.
    pub fn symbol(&mut self, name: impl Into<String>, rows: usize, cols: usize) -> ExprId {
        self.push(Op::Symbol { name: name.into() }, Vec::new(), Shape::new(rows, cols))
    }

    pub fn scalar_symbol(&mut self, name: impl Into<String>) -> ExprId {
        self.symbol(name, 1, 1)
    }

    pub fn column_symbol(&mut self, name: impl Into<String>, rows: usize) -> ExprId {
        self.symbol(name, rows, 1)
    }

    pub fn constant(&mut self, value: Array2<f64>) -> ExprId {
        let shape = Shape::from(value.dim());
        self.push(Op::Constant(value), Vec::new(), shape)
    }

    pub fn scalar(&mut self, value: f64) -> ExprId {
        self.constant(Array2::from_elem((1, 1), value))
    }
}
