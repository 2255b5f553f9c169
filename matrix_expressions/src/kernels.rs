use ndarray::{Array2, ArrayView2, Axis, s};

use crate::compile::InstrKind;
use crate::shape::Shape;
use crate::traits::Scalar;
use crate::utils::{flatten_col_major, from_col_major};

pub fn constant<T: Scalar>(value: &Array2<f64>) -> Array2<T> {
    value.mapv(T::from_f64)
}

pub fn transpose<T: Scalar>(a: &Array2<T>) -> Array2<T> {
    a.t().as_standard_layout().into_owned()
}

/// Reinterpret the column-major element sequence of `a` as `shape`.
pub fn reshape<T: Scalar>(a: &Array2<T>, shape: Shape) -> Array2<T> {
    from_col_major(shape, &flatten_col_major(a))
}

pub fn vertcat<T: Scalar>(parts: &[&Array2<T>], shape: Shape) -> Array2<T> {
    let mut out = Array2::zeros(shape.dim());
    let mut r0 = 0;
    for p in parts {
        out.slice_mut(s![r0..r0 + p.nrows(), ..]).assign(*p);
        r0 += p.nrows();
    }
    out
}

pub fn horzcat<T: Scalar>(parts: &[&Array2<T>], shape: Shape) -> Array2<T> {
    let mut out = Array2::zeros(shape.dim());
    let mut c0 = 0;
    for p in parts {
        out.slice_mut(s![.., c0..c0 + p.ncols()]).assign(*p);
        c0 += p.ncols();
    }
    out
}

pub fn gather<T: Scalar>(a: &Array2<T>, rows: &[usize], cols: &[usize]) -> Array2<T> {
    a.select(Axis(0), rows).select(Axis(1), cols)
}

/// Adjoint of [`gather`]: add `src` into the selected positions of `dst`.
pub fn scatter_add<T: Scalar>(dst: &mut Array2<T>, src: ArrayView2<'_, T>, rows: &[usize], cols: &[usize]) {
    for (i, &r) in rows.iter().enumerate() {
        for (j, &c) in cols.iter().enumerate() {
            dst[[r, c]] = dst[[r, c]] + src[[i, j]];
        }
    }
}

/// Apply an operator instruction to already evaluated operands.
///
/// Leaves (`Input`, `Constant`) carry no operands and are resolved by the caller.
pub fn apply<T: Scalar>(kind: &InstrKind, args: &[&Array2<T>], shape: Shape) -> Array2<T> {
    match kind {
        InstrKind::Input { .. } | InstrKind::Constant(_) => {
            unreachable!("leaf instructions are resolved by the evaluator")
        }
        InstrKind::Add => args[0] + args[1],
        InstrKind::Sub => args[0] - args[1],
        InstrKind::Mul => args[0] * args[1],
        InstrKind::Neg => args[0].mapv(|v| -v),
        InstrKind::Scale(k) => args[0] * T::from_f64(*k),
        InstrKind::MatMul => args[0].dot(args[1]),
        InstrKind::Transpose => transpose(args[0]),
        InstrKind::Reshape => reshape(args[0], shape),
        InstrKind::Vertcat => vertcat(args, shape),
        InstrKind::Horzcat => horzcat(args, shape),
        InstrKind::Slice { rows, cols } => gather(args[0], rows, cols),
    }
}
