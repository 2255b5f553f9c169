use ndarray::{Array2, ArrayView2};

use crate::compile::{EvalPlan, InstrKind};
use crate::error::{BindingMismatch, ExprError, Result};
use crate::function::Function;
use crate::kernels;
use crate::shape::Shape;
use crate::traits::Scalar;
use crate::utils::ZipEq;

#[derive(Copy, Clone, Debug, Default)]
pub struct EvalOptions {
    /// Reject outputs containing NaN or infinite entries.
    pub check_finite: bool,
}

/// Scratch storage for repeated evaluation.
///
/// Reusing a context between calls only saves allocations of the slot table; it is reset at
/// the start of every call, so no value survives from one call to the next.
#[derive(Debug)]
pub struct EvalContext<T: Scalar> {
    pub scratch: Vec<Array2<T>>,
}

impl<T: Scalar> Default for EvalContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> EvalContext<T> {
    pub fn new() -> Self {
        Self { scratch: Vec::new() }
    }

    pub(crate) fn setup(&mut self, n_slots: usize) {
        reset_slots(&mut self.scratch, n_slots);
    }
}

pub(crate) fn reset_slots<T: Scalar>(slots: &mut Vec<Array2<T>>, n_slots: usize) {
    slots.clear();
    slots.resize_with(n_slots, || Array2::zeros((0, 0)));
}

/// Check that `values` match `expected` in count and shape.
pub(crate) fn check_bindings<T>(what: &'static str, expected: &[Shape], values: &[ArrayView2<'_, T>]) -> Result<()> {
    if expected.len() != values.len() {
        return Err(BindingMismatch::Count {
            what,
            expected: expected.len(),
            got: values.len(),
        }
        .into());
    }
    for (index, (&shape, v)) in expected.iter().zip_eq(values).enumerate() {
        let got = Shape::from(v.dim());
        if got != shape {
            return Err(BindingMismatch::Shape {
                what,
                index,
                expected: shape,
                got,
            }
            .into());
        }
    }
    Ok(())
}

pub(crate) fn check_outputs<T: Scalar>(outputs: &[Array2<T>], opts: &EvalOptions) -> Result<()> {
    if !opts.check_finite {
        return Ok(());
    }
    match outputs.iter().position(|o| !o.iter().all(|v| v.is_finite())) {
        Some(output) => Err(ExprError::NonFinite { output }),
        None => Ok(()),
    }
}

/// Evaluate `function` once with a fresh context and default options.
pub fn evaluate<T: Scalar>(function: &Function, inputs: &[ArrayView2<'_, T>]) -> Result<Vec<Array2<T>>> {
    let mut ctx = EvalContext::new();
    eval_plan_into(function.plan(), inputs, &mut ctx, &EvalOptions::default())
}

/// Run `plan` over concrete `inputs`.
///
/// Bindings are checked before anything is computed, and nothing is returned on failure.
pub fn eval_plan_into<T: Scalar>(
    plan: &EvalPlan,
    inputs: &[ArrayView2<'_, T>],
    ctx: &mut EvalContext<T>,
    opts: &EvalOptions,
) -> Result<Vec<Array2<T>>> {
    check_bindings("input", &plan.input_shapes, inputs)?;
    ctx.setup(plan.n_slots);
    log::trace!("evaluating {} instructions over {} slots", plan.instrs.len(), plan.n_slots);

    let scratch = &mut ctx.scratch;
    for instr in &plan.instrs {
        let value = match &instr.kind {
            InstrKind::Input { position } => inputs[*position].to_owned(),
            InstrKind::Constant(v) => kernels::constant(v),
            kind => {
                let args: Vec<&Array2<T>> = instr.args.iter().map(|&a| &scratch[plan.instrs[a].dst]).collect();
                kernels::apply(kind, &args, instr.shape)
            }
        };
        scratch[instr.dst] = value;
    }

    let outputs: Vec<Array2<T>> = plan
        .outputs
        .iter()
        .map(|&o| scratch[plan.instrs[o].dst].clone())
        .collect();
    check_outputs(&outputs, opts)?;
    Ok(outputs)
}
