use core::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::{ExprError, IndexAxis, Result};

/// Selection along one matrix dimension.
///
/// Negative positions count from the end (`-1` is the last row/column). Ranges are half-open
/// and follow Python slicing: bounds are clamped to the extent, omitted bounds cover the whole
/// extent in the direction of `step`. A single index keeps the dimension with extent 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Index {
    At(isize),
    Range {
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    },
}

impl Index {
    pub const ALL: Index = Index::Range {
        start: None,
        stop: None,
        step: 1,
    };

    pub const fn range(start: isize, stop: isize) -> Self {
        Index::Range {
            start: Some(start),
            stop: Some(stop),
            step: 1,
        }
    }

    /// Replace the step of a range. A single index is turned into the range it denotes.
    pub const fn step_by(self, step: isize) -> Self {
        match self {
            Index::At(i) => Index::Range {
                start: Some(i),
                stop: if i == -1 { None } else { Some(i.saturating_add(1)) },
                step,
            },
            Index::Range { start, stop, .. } => Index::Range { start, stop, step },
        }
    }

    pub const fn is_single(self) -> bool {
        matches!(self, Index::At(_))
    }

    /// Resolve against an extent of `dim`, returning the selected positions in order.
    pub fn resolve(self, dim: usize, axis: IndexAxis) -> Result<Vec<usize>> {
        let len = isize::try_from(dim).unwrap_or(isize::MAX);
        match self {
            Index::At(i) => {
                let j = if i < 0 { i + len } else { i };
                if j < 0 || j >= len {
                    return Err(ExprError::IndexOutOfRange { axis, index: i, dim });
                }
                Ok(vec![j as usize])
            }
            Index::Range { start, stop, step } => {
                if step == 0 {
                    return Err(ExprError::ZeroStep { axis });
                }
                let (lower, upper) = if step > 0 { (0, len) } else { (-1, len - 1) };
                let clamp = |v: isize| {
                    let v = if v < 0 { v + len } else { v };
                    v.clamp(lower, upper)
                };
                let start = start.map_or(if step > 0 { lower } else { upper }, clamp);
                let stop = stop.map_or(if step > 0 { upper } else { lower }, clamp);

                let mut out = Vec::new();
                let mut i = start;
                while (step > 0 && i < stop) || (step < 0 && i > stop) {
                    out.push(i as usize);
                    match i.checked_add(step) {
                        Some(next) => i = next,
                        None => break,
                    }
                }
                Ok(out)
            }
        }
    }
}

impl From<RangeFull> for Index {
    fn from(_: RangeFull) -> Self {
        Index::ALL
    }
}

fn to_isize<I: num_traits::ToPrimitive>(v: I) -> isize {
    v.to_isize().unwrap_or(isize::MAX)
}

macro_rules! impl_index_from_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Index {
                fn from(i: $t) -> Self {
                    Index::At(to_isize(i))
                }
            }

            impl From<Range<$t>> for Index {
                fn from(r: Range<$t>) -> Self {
                    Index::range(to_isize(r.start), to_isize(r.end))
                }
            }

            impl From<RangeFrom<$t>> for Index {
                fn from(r: RangeFrom<$t>) -> Self {
                    Index::Range { start: Some(to_isize(r.start)), stop: None, step: 1 }
                }
            }

            impl From<RangeTo<$t>> for Index {
                fn from(r: RangeTo<$t>) -> Self {
                    Index::Range { start: None, stop: Some(to_isize(r.end)), step: 1 }
                }
            }
        )*
    };
}

impl_index_from_int!(i32, i64, isize, usize);
