use ndarray::{Array2, ArrayBase, Data, Ix2};
use num_traits::Zero;

use crate::shape::Shape;

/// `.zip()` that debug-asserts both sides have the same length.
pub trait ZipEq: ExactSizeIterator + Sized {
    #[inline]
    fn zip_eq<B>(self, other: B) -> std::iter::Zip<Self, B::IntoIter>
    where
        B: IntoIterator,
        B::IntoIter: ExactSizeIterator,
    {
        let other = other.into_iter();
        debug_assert_eq!(self.len(), other.len(), "zip_eq: length mismatch");
        self.zip(other)
    }
}

impl<I: ExactSizeIterator> ZipEq for I {}

/// Elements of `a` in column-major order.
pub fn flatten_col_major<S, T>(a: &ArrayBase<S, Ix2>) -> Vec<T>
where
    S: Data<Elem = T>,
    T: Copy,
{
    a.t().iter().copied().collect()
}

/// Matrix of `shape` whose column-major element sequence is `data`.
pub fn from_col_major<T: Copy>(shape: Shape, data: &[T]) -> Array2<T> {
    debug_assert_eq!(data.len(), shape.numel());
    Array2::from_shape_fn(shape.dim(), |(i, j)| data[i + j * shape.rows])
}

/// Zero matrix of `shape` with a one at column-major position `k`.
pub fn unit_seed<T: Copy + Zero + num_traits::One>(shape: Shape, k: usize) -> Array2<T> {
    let mut seed = Array2::zeros(shape.dim());
    seed[[k % shape.rows, k / shape.rows]] = T::one();
    seed
}
