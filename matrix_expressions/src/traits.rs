use core::fmt;

use ndarray::{LinalgScalar, ScalarOperand};
use num_traits::{Float, NumAssign};

/// Element type a [`Function`](crate::Function) can be evaluated in (`f32` or `f64`).
///
/// Graph literals are stored as `f64` and cast with [`Scalar::from_f64`] when a plan runs.
pub trait Scalar: Float + NumAssign + LinalgScalar + ScalarOperand + fmt::Debug + Send + Sync {
    #[inline]
    fn from_f64(v: f64) -> Self {
        <Self as num_traits::NumCast>::from(v).unwrap_or_else(Self::nan)
    }
}

impl<T> Scalar for T where T: Float + NumAssign + LinalgScalar + ScalarOperand + fmt::Debug + Send + Sync {}
