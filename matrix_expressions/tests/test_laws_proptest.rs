mod common;

use common::*;
use matrix_expressions::{ExprGraph, Function, Index};
use ndarray::Array2;
use proptest::prelude::*;

fn arb_matrix(rows: usize, cols: usize) -> impl Strategy<Value = Array2<f64>> {
    prop::collection::vec(-10.0f64..10.0, rows * cols)
        .prop_map(move |data| Array2::from_shape_vec((rows, cols), data).unwrap())
}

fn arb_shaped() -> impl Strategy<Value = Array2<f64>> {
    (0usize..5, 0usize..5).prop_flat_map(|(r, c)| arb_matrix(r, c))
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn transpose_is_an_involution(a in arb_shaped()) {
        let mut g = ExprGraph::new();
        let x = g.symbol("x", a.nrows(), a.ncols());
        let t = g.transpose(x).unwrap();
        let tt = g.transpose(t).unwrap();
        let f = Function::new(&g, &[x], &[t, tt]).unwrap();
        let out = f.call(&[a.view()]).unwrap();
        prop_assert_eq!(&out[0], &a.t().to_owned());
        prop_assert_eq!(&out[1], &a);
    }

    #[test]
    fn reshape_round_trips_and_preserves_order(a in arb_shaped()) {
        let (r, c) = a.dim();
        let mut g = ExprGraph::new();
        let x = g.symbol("x", r, c);
        let flat = g.flatten(x).unwrap();
        let back = g.reshape(flat, r, c).unwrap();
        let row = g.reshape(x, 1, r * c).unwrap();
        let f = Function::new(&g, &[x], &[flat, back, row]).unwrap();
        let out = f.call(&[a.view()]).unwrap();
        prop_assert_eq!(&out[0], &reshape_ref(&a, r * c, 1));
        prop_assert_eq!(&out[1], &a);
        prop_assert_eq!(out[2].iter().copied().collect::<Vec<_>>(), out[0].iter().copied().collect::<Vec<_>>());
    }

    #[test]
    fn vertcat_then_slice_recovers_parts(
        (a, b) in (0usize..4, 0usize..4, 0usize..4)
            .prop_flat_map(|(ra, rb, c)| (arb_matrix(ra, c), arb_matrix(rb, c)))
    ) {
        let mut g = ExprGraph::new();
        let x = g.symbol("x", a.nrows(), a.ncols());
        let y = g.symbol("y", b.nrows(), b.ncols());
        let v = g.vertcat(&[x, y]).unwrap();
        let n = a.nrows() as isize;
        let top = g.slice(v, ..n, Index::ALL).unwrap();
        let bottom = g.slice(v, n.., Index::ALL).unwrap();
        let f = Function::new(&g, &[x, y], &[top, bottom]).unwrap();
        let out = f.call(&[a.view(), b.view()]).unwrap();
        prop_assert_eq!(&out[0], &a);
        prop_assert_eq!(&out[1], &b);
    }

    #[test]
    fn product_transpose_law(
        (a, b) in (0usize..4, 0usize..4, 0usize..4)
            .prop_flat_map(|(m, k, n)| (arb_matrix(m, k), arb_matrix(k, n)))
    ) {
        let mut g = ExprGraph::new();
        let x = g.symbol("x", a.nrows(), a.ncols());
        let y = g.symbol("y", b.nrows(), b.ncols());
        let xy = g.mtimes(x, y).unwrap();
        let lhs = g.transpose(xy).unwrap();
        let (xt, yt) = (g.transpose(x).unwrap(), g.transpose(y).unwrap());
        let rhs = g.mtimes(yt, xt).unwrap();
        let f = Function::new(&g, &[x, y], &[lhs, rhs]).unwrap();
        let out = f.call(&[a.view(), b.view()]).unwrap();
        assert_close_mat(&out[0], &out[1], 1e-10);
    }

    #[test]
    fn reverse_agrees_with_jacobian(a in arb_shaped()) {
        let (r, c) = a.dim();
        let mut g = ExprGraph::new();
        let x = g.symbol("x", r, c);
        let xt = g.transpose(x).unwrap();
        let gram = g.mtimes(xt, x).unwrap();
        let sq = g.mul(gram, gram).unwrap();
        let out = g.sub(sq, gram).unwrap();
        let f = Function::new(&g, &[x], &[out]).unwrap();

        let j = f.jacobian(&[a.view()], 0, 0).unwrap();
        let ones = Array2::<f64>::ones((c, c));
        let rev = f.reverse(&[a.view()], &[ones.view()]).unwrap();
        // With an all-ones adjoint the input adjoint is the column sums of J.
        let col_sums = j.sum_axis(ndarray::Axis(0));
        let adj = matrix_expressions::utils::flatten_col_major(&rev.derivatives[0]);
        for (s, v) in col_sums.iter().zip(adj.iter()) {
            prop_assert!((s - v).abs() <= 1e-8 * (1.0 + s.abs()));
        }
    }
}
