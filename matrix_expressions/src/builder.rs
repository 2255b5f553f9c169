//! Shape-checked construction of expression nodes.
//!
//! Every builder validates its operands eagerly and appends a fresh node; operands are never
//! modified, and no algebraic simplification is applied.

use crate::error::{ExprError, IndexAxis, Result};
use crate::graph::ExprGraph;
use crate::index::Index;
use crate::node::{ExprId, Op};
use crate::shape::Shape;

macro_rules! elementwise_binary {
    ($(#[$meta:meta])* $method:ident => $op:ident, $name:literal) => {
        $(#[$meta])*
        pub fn $method(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
            let (lhs, rhs) = (self.shape(a)?, self.shape(b)?);
            if lhs != rhs {
                return Err(ExprError::ShapeMismatch { op: $name, lhs, rhs });
            }
            Ok(self.push(Op::$op, vec![a, b], lhs))
        }
    };
}

impl ExprGraph {
    elementwise_binary!(
        /// Elementwise sum of two equally shaped operands.
        add => Add, "add"
    );
    elementwise_binary!(sub => Sub, "sub");
    elementwise_binary!(
        /// Elementwise (Hadamard) product. See [`ExprGraph::mtimes`] for the matrix product.
        mul => Mul, "mul"
    );

    pub fn neg(&mut self, a: ExprId) -> Result<ExprId> {
        let shape = self.shape(a)?;
        Ok(self.push(Op::Neg, vec![a], shape))
    }

    /// Multiply every element by a literal.
    pub fn scale(&mut self, a: ExprId, k: f64) -> Result<ExprId> {
        let shape = self.shape(a)?;
        Ok(self.push(Op::Scale(k), vec![a], shape))
    }

    pub fn mtimes(&mut self, a: ExprId, b: ExprId) -> Result<ExprId> {
        let (lhs, rhs) = (self.shape(a)?, self.shape(b)?);
        if lhs.cols != rhs.rows {
            return Err(ExprError::ShapeMismatch { op: "mtimes", lhs, rhs });
        }
        Ok(self.push(Op::MatMul, vec![a, b], Shape::new(lhs.rows, rhs.cols)))
    }

    pub fn transpose(&mut self, a: ExprId) -> Result<ExprId> {
        let shape = self.shape(a)?.transposed();
        Ok(self.push(Op::Transpose, vec![a], shape))
    }

    /// Reinterpret the column-major element sequence of `a` with a new shape.
    pub fn reshape(&mut self, a: ExprId, rows: usize, cols: usize) -> Result<ExprId> {
        let from = self.shape(a)?;
        let to = Shape::new(rows, cols);
        match (from.checked_numel(), to.checked_numel()) {
            (Some(n), Some(m)) if n == m => {}
            _ => return Err(ExprError::ElementCountMismatch { from, to }),
        }
        Ok(self.push(Op::Reshape, vec![a], to))
    }

    /// Column vector of all elements in column-major order.
    pub fn flatten(&mut self, a: ExprId) -> Result<ExprId> {
        let from = self.shape(a)?;
        let n = from.checked_numel().ok_or(ExprError::ElementCountMismatch {
            from,
            to: Shape::new(usize::MAX, 1),
        })?;
        self.reshape(a, n, 1)
    }

    /// Stack operands top to bottom. All operands must have the same column count; an empty
    /// list yields a 0x0 expression.
    pub fn vertcat(&mut self, parts: &[ExprId]) -> Result<ExprId> {
        let mut shape: Option<Shape> = None;
        for &p in parts {
            let s = self.shape(p)?;
            shape = Some(match shape {
                None => s,
                Some(acc) => match acc.rows.checked_add(s.rows).map(|rows| Shape::new(rows, acc.cols)) {
                    Some(sum) if acc.cols == s.cols => sum,
                    _ => {
                        return Err(ExprError::ShapeMismatch {
                            op: "vertcat",
                            lhs: acc,
                            rhs: s,
                        });
                    }
                },
            });
        }
        Ok(self.push(Op::Vertcat, parts.to_vec(), shape.unwrap_or_default()))
    }

    /// Place operands left to right. All operands must have the same row count; an empty list
    /// yields a 0x0 expression.
    pub fn horzcat(&mut self, parts: &[ExprId]) -> Result<ExprId> {
        let mut shape: Option<Shape> = None;
        for &p in parts {
            let s = self.shape(p)?;
            shape = Some(match shape {
                None => s,
                Some(acc) => match acc.cols.checked_add(s.cols).map(|cols| Shape::new(acc.rows, cols)) {
                    Some(sum) if acc.rows == s.rows => sum,
                    _ => {
                        return Err(ExprError::ShapeMismatch {
                            op: "horzcat",
                            lhs: acc,
                            rhs: s,
                        });
                    }
                },
            });
        }
        Ok(self.push(Op::Horzcat, parts.to_vec(), shape.unwrap_or_default()))
    }

    /// Two-dimensional selection, e.g. `g.slice(x, 1, ..)` or `g.slice(x, 0..-2, -1)`.
    pub fn slice(&mut self, a: ExprId, rows: impl Into<Index>, cols: impl Into<Index>) -> Result<ExprId> {
        let shape = self.shape(a)?;
        let (rows_ix, cols_ix) = (rows.into(), cols.into());
        let rows = rows_ix.resolve(shape.rows, IndexAxis::Row)?;
        let cols = cols_ix.resolve(shape.cols, IndexAxis::Col)?;
        let out = Shape::new(rows.len(), cols.len());
        let single = (rows_ix.is_single(), cols_ix.is_single());
        Ok(self.push(Op::Slice { rows, cols, single }, vec![a], out))
    }

    /// The 1x1 element at `(i, j)`.
    pub fn element(&mut self, a: ExprId, i: isize, j: isize) -> Result<ExprId> {
        self.slice(a, Index::At(i), Index::At(j))
    }

    /// The 1x1 element at column-major position `k` (negative counts from the end).
    pub fn index(&mut self, a: ExprId, k: isize) -> Result<ExprId> {
        let shape = self.shape(a)?;
        let numel = shape.checked_numel().unwrap_or(usize::MAX);
        let k = Index::At(k).resolve(numel, IndexAxis::Linear)?[0];
        let (i, j) = (k % shape.rows, k / shape.rows);
        let out = Shape::scalar();
        Ok(self.push(
            Op::Slice {
                rows: vec![i],
                cols: vec![j],
                single: (true, true),
            },
            vec![a],
            out,
        ))
    }

    pub fn row(&mut self, a: ExprId, i: isize) -> Result<ExprId> {
        self.slice(a, Index::At(i), Index::ALL)
    }

    pub fn col(&mut self, a: ExprId, j: isize) -> Result<ExprId> {
        self.slice(a, Index::ALL, Index::At(j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_never_touch_operands() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x", 2, 3);
        let before = g.node(x).unwrap().clone();
        let t = g.transpose(x).unwrap();
        let _ = g.reshape(t, 6, 1).unwrap();
        assert_eq!(g.node(x).unwrap(), &before);
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn linear_index_is_column_major() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x", 2, 3);
        let e = g.index(x, 3).unwrap();
        match &g.node(e).unwrap().op {
            Op::Slice { rows, cols, .. } => {
                assert_eq!(rows, &vec![1]);
                assert_eq!(cols, &vec![1]);
            }
            other => panic!("unexpected op {other:?}"),
        }
        let last = g.index(x, -1).unwrap();
        assert!(matches!(&g.node(last).unwrap().op, Op::Slice { rows, cols, .. } if rows == &[1] && cols == &[2]));
        assert!(matches!(
            g.index(x, 6),
            Err(ExprError::IndexOutOfRange {
                axis: IndexAxis::Linear,
                ..
            })
        ));
    }

    #[test]
    fn oversized_shapes_are_rejected() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x", 2, 3);
        assert!(matches!(
            g.reshape(x, usize::MAX, 2),
            Err(ExprError::ElementCountMismatch { .. })
        ));

        let tall = g.symbol("tall", usize::MAX, 1);
        let huge = g.symbol("huge", usize::MAX, usize::MAX);
        let one = g.symbol("one", 1, 1);
        assert!(matches!(g.flatten(huge), Err(ExprError::ElementCountMismatch { .. })));
        assert!(matches!(
            g.vertcat(&[tall, one]),
            Err(ExprError::ShapeMismatch { op: "vertcat", .. })
        ));
        let wide = g.symbol("wide", 1, usize::MAX);
        assert!(matches!(
            g.horzcat(&[one, wide]),
            Err(ExprError::ShapeMismatch { op: "horzcat", .. })
        ));
        assert_eq!(g.len(), 5);
    }

    #[test]
    fn slices_remember_single_axes() {
        let mut g = ExprGraph::new();
        let x = g.symbol("x", 3, 3);
        let a = g.slice(x, 1, 0..1).unwrap();
        assert!(matches!(&g.node(a).unwrap().op, Op::Slice { single: (true, false), .. }));
        let e = g.index(x, 4).unwrap();
        assert!(matches!(&g.node(e).unwrap().op, Op::Slice { single: (true, true), .. }));
    }
}
