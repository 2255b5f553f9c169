use approx::assert_relative_eq;
use matrix_expressions::utils::{flatten_col_major, from_col_major};
use matrix_expressions::{ExprGraph, ExprId, Function, Shape};
use ndarray::{Array2, ArrayView2, Axis, concatenate};

pub const L: [f64; 3] = [1.0, 2.0, 3.0];

/// Matrix-valued expression over a single symbol, with its expected value for `L`.
#[allow(dead_code)]
pub struct Fixture {
    pub graph: ExprGraph,
    pub x: ExprId,
    pub z: ExprId,
    pub input: Array2<f64>,
    pub expected: Array2<f64>,
}

/// `x` is 1x3 and `z` stacks `x*(i+1)` for i in 0..8, giving 8x3.
#[allow(dead_code)]
pub fn stacked_rows() -> Fixture {
    let mut graph = ExprGraph::new();
    let x = graph.symbol("x", 1, 3);
    let parts: Vec<ExprId> = (0..8).map(|i| graph.scale(x, (i + 1) as f64).unwrap()).collect();
    let z = graph.vertcat(&parts).unwrap();
    Fixture {
        graph,
        x,
        z,
        input: Array2::from_shape_vec((1, 3), L.to_vec()).unwrap(),
        expected: Array2::from_shape_fn((8, 3), |(i, j)| L[j] * (i + 1) as f64),
    }
}

/// `x` is 3x1 and `z` places `x*i` side by side for i in 0..8, giving 3x8.
#[allow(dead_code)]
pub fn stacked_cols() -> Fixture {
    let mut graph = ExprGraph::new();
    let x = graph.symbol("x", 3, 1);
    let parts: Vec<ExprId> = (0..8).map(|i| graph.scale(x, i as f64).unwrap()).collect();
    let z = graph.horzcat(&parts).unwrap();
    Fixture {
        graph,
        x,
        z,
        input: Array2::from_shape_vec((3, 1), L.to_vec()).unwrap(),
        expected: Array2::from_shape_fn((3, 8), |(i, j)| L[i] * j as f64),
    }
}

/// `x` is 3x1, its elements are laid out as a 1x3 row `p`, and `z` stacks `p*i` for i in 0..8.
#[allow(dead_code)]
pub fn element_snippet() -> Fixture {
    let mut graph = ExprGraph::new();
    let x = graph.symbol("x", 3, 1);
    let elems: Vec<ExprId> = (0..3).map(|i| graph.element(x, i, 0).unwrap()).collect();
    let p = graph.horzcat(&elems).unwrap();
    let parts: Vec<ExprId> = (0..8).map(|i| graph.scale(p, i as f64).unwrap()).collect();
    let z = graph.vertcat(&parts).unwrap();
    Fixture {
        graph,
        x,
        z,
        input: Array2::from_shape_vec((3, 1), L.to_vec()).unwrap(),
        expected: Array2::from_shape_fn((8, 3), |(i, j)| L[j] * i as f64),
    }
}

/// Shape-manipulating wrapper applied on top of a fixture's expression.
#[allow(dead_code)]
#[derive(Copy, Clone, Debug)]
pub enum Composition {
    Identity,
    Trans,
    TransTrans,
    FlattenTrans,
    TransFlatten,
    Reshape4x6,
    ReshapeTrans,
    TransReshape,
    VertcatOne,
    VertcatDoubled,
    HorzcatOne,
    HorzcatDoubled,
}

#[allow(dead_code)]
impl Composition {
    pub fn build(self, g: &mut ExprGraph, z: ExprId) -> ExprId {
        let out = match self {
            Composition::Identity => Ok(z),
            Composition::Trans => g.transpose(z),
            Composition::TransTrans => g.transpose(z).and_then(|t| g.transpose(t)),
            Composition::FlattenTrans => g.transpose(z).and_then(|t| g.flatten(t)),
            Composition::TransFlatten => g.flatten(z).and_then(|f| g.transpose(f)),
            Composition::Reshape4x6 => g.reshape(z, 4, 6),
            Composition::ReshapeTrans => g.transpose(z).and_then(|t| g.reshape(t, 4, 6)),
            Composition::TransReshape => g.reshape(z, 4, 6).and_then(|r| g.transpose(r)),
            Composition::VertcatOne => g.vertcat(&[z]),
            Composition::VertcatDoubled => g.scale(z, 2.0).and_then(|d| g.vertcat(&[z, d])),
            Composition::HorzcatOne => g.horzcat(&[z]),
            Composition::HorzcatDoubled => g.scale(z, 2.0).and_then(|d| g.horzcat(&[z, d])),
        };
        out.unwrap()
    }

    pub fn reference(self, a: &Array2<f64>) -> Array2<f64> {
        let t = || a.t().to_owned();
        match self {
            Composition::Identity | Composition::TransTrans | Composition::VertcatOne | Composition::HorzcatOne => {
                a.clone()
            }
            Composition::Trans => t(),
            Composition::FlattenTrans => reshape_ref(&t(), a.len(), 1),
            Composition::TransFlatten => reshape_ref(a, 1, a.len()),
            Composition::Reshape4x6 => reshape_ref(a, 4, 6),
            Composition::ReshapeTrans => reshape_ref(&t(), 4, 6),
            Composition::TransReshape => reshape_ref(a, 4, 6).t().to_owned(),
            Composition::VertcatDoubled => concatenate(Axis(0), &[a.view(), (a * 2.0).view()]).unwrap(),
            Composition::HorzcatDoubled => concatenate(Axis(1), &[a.view(), (a * 2.0).view()]).unwrap(),
        }
    }
}

/// Column-major reshape computed directly on a dense matrix.
#[allow(dead_code)]
pub fn reshape_ref(a: &Array2<f64>, rows: usize, cols: usize) -> Array2<f64> {
    from_col_major(Shape::new(rows, cols), &flatten_col_major(a))
}

#[allow(dead_code)]
pub fn eval1(g: &ExprGraph, x: ExprId, out: ExprId, input: ArrayView2<'_, f64>) -> Array2<f64> {
    let f = Function::new(g, &[x], &[out]).unwrap();
    f.call(&[input]).unwrap().remove(0)
}

#[allow(dead_code)]
pub fn assert_close_mat(a: &Array2<f64>, b: &Array2<f64>, tol: f64) {
    assert_eq!(a.dim(), b.dim());
    for (&av, &bv) in a.iter().zip(b.iter()) {
        assert_relative_eq!(av, bv, epsilon = tol, max_relative = tol);
    }
}

/// Central differences of output `output` along `dir`, one entry per output element.
#[allow(dead_code)]
pub fn finite_diff_dir(
    f: &Function,
    inputs: &[Array2<f64>],
    dirs: &[Array2<f64>],
    output: usize,
    eps: f64,
) -> Array2<f64> {
    let shifted = |sign: f64| -> Vec<Array2<f64>> {
        inputs
            .iter()
            .zip(dirs.iter())
            .map(|(x, d)| x + &(d * (sign * eps)))
            .collect()
    };
    let run = |v: &[Array2<f64>]| -> Array2<f64> {
        let views: Vec<ArrayView2<'_, f64>> = v.iter().map(|a| a.view()).collect();
        f.call(&views).unwrap().remove(output)
    };
    (run(&shifted(1.0)) - run(&shifted(-1.0))) / (2.0 * eps)
}
