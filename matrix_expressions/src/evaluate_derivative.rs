use ndarray::{Array2, ArrayView2};

use crate::compile::{EvalPlan, InstrKind};
use crate::error::{ExprError, Result};
use crate::evaluate::{EvalOptions, check_bindings, check_outputs, reset_slots};
use crate::kernels;
use crate::shape::Shape;
use crate::traits::Scalar;
use crate::utils::{ZipEq, flatten_col_major, unit_seed};

/// Scratch storage for derivative sweeps: one table for values, one for tangents/adjoints.
#[derive(Debug)]
pub struct DiffContext<T: Scalar> {
    pub val_scratch: Vec<Array2<T>>,
    pub der_scratch: Vec<Array2<T>>,
}

impl<T: Scalar> Default for DiffContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> DiffContext<T> {
    pub fn new() -> Self {
        Self {
            val_scratch: Vec::new(),
            der_scratch: Vec::new(),
        }
    }

    fn setup(&mut self, n_slots: usize) {
        reset_slots(&mut self.val_scratch, n_slots);
        reset_slots(&mut self.der_scratch, n_slots);
    }
}

/// Outputs together with their directional derivatives (forward mode) or the function inputs'
/// adjoints (reverse mode).
#[derive(Clone, Debug)]
pub struct Sensitivities<T> {
    pub outputs: Vec<Array2<T>>,
    pub derivatives: Vec<Array2<T>>,
}

/// Forward mode: propagate one tangent per input alongside the values.
///
/// `seeds[k]` must have the shape of input `k`; `derivatives[k]` of the result has the shape of
/// output `k`.
pub fn eval_forward_into<T: Scalar>(
    plan: &EvalPlan,
    inputs: &[ArrayView2<'_, T>],
    seeds: &[ArrayView2<'_, T>],
    ctx: &mut DiffContext<T>,
    opts: &EvalOptions,
) -> Result<Sensitivities<T>> {
    check_bindings("input", &plan.input_shapes, inputs)?;
    check_bindings("forward seed", &plan.input_shapes, seeds)?;
    ctx.setup(plan.n_slots);
    log::trace!("forward sweep over {} instructions", plan.instrs.len());

    let vals = &mut ctx.val_scratch;
    let ders = &mut ctx.der_scratch;
    for instr in &plan.instrs {
        let (value, tangent) = match &instr.kind {
            InstrKind::Input { position } => (inputs[*position].to_owned(), seeds[*position].to_owned()),
            InstrKind::Constant(v) => (kernels::constant(v), Array2::zeros(instr.shape.dim())),
            kind => {
                let args: Vec<&Array2<T>> = instr.args.iter().map(|&a| &vals[plan.instrs[a].dst]).collect();
                let dargs: Vec<&Array2<T>> = instr.args.iter().map(|&a| &ders[plan.instrs[a].dst]).collect();
                let value = kernels::apply(kind, &args, instr.shape);
                let tangent = match kind {
                    InstrKind::Mul => dargs[0] * args[1] + args[0] * dargs[1],
                    InstrKind::MatMul => dargs[0].dot(args[1]) + args[0].dot(dargs[1]),
                    linear => kernels::apply(linear, &dargs, instr.shape),
                };
                (value, tangent)
            }
        };
        vals[instr.dst] = value;
        ders[instr.dst] = tangent;
    }

    let collect = |table: &[Array2<T>]| -> Vec<Array2<T>> {
        plan.outputs.iter().map(|&o| table[plan.instrs[o].dst].clone()).collect()
    };
    let outputs = collect(vals.as_slice());
    check_outputs(&outputs, opts)?;
    Ok(Sensitivities {
        outputs,
        derivatives: collect(ders.as_slice()),
    })
}

/// Reverse mode: pull one adjoint per output back to the inputs.
///
/// `adjoint_seeds[k]` must have the shape of output `k`; `derivatives[k]` of the result has the
/// shape of input `k` (zero for inputs no output depends on). The forward sweep keeps every
/// intermediate value, independent of the plan's slot assignment.
pub fn eval_reverse_into<T: Scalar>(
    plan: &EvalPlan,
    inputs: &[ArrayView2<'_, T>],
    adjoint_seeds: &[ArrayView2<'_, T>],
    ctx: &mut DiffContext<T>,
    opts: &EvalOptions,
) -> Result<Sensitivities<T>> {
    check_bindings("input", &plan.input_shapes, inputs)?;
    let output_shapes: Vec<Shape> = plan.output_shapes().collect();
    check_bindings("adjoint seed", &output_shapes, adjoint_seeds)?;
    let n = plan.instrs.len();
    ctx.setup(n);
    log::trace!("reverse sweep over {} instructions", n);

    let vals = &mut ctx.val_scratch;
    for (i, instr) in plan.instrs.iter().enumerate() {
        let value = match &instr.kind {
            InstrKind::Input { position } => inputs[*position].to_owned(),
            InstrKind::Constant(v) => kernels::constant(v),
            kind => {
                let args: Vec<&Array2<T>> = instr.args.iter().map(|&a| &vals[a]).collect();
                kernels::apply(kind, &args, instr.shape)
            }
        };
        vals[i] = value;
    }
    let outputs: Vec<Array2<T>> = plan.outputs.iter().map(|&o| vals[o].clone()).collect();
    check_outputs(&outputs, opts)?;

    let adj = &mut ctx.der_scratch;
    for (instr, a) in plan.instrs.iter().zip_eq(adj.iter_mut()) {
        *a = Array2::zeros(instr.shape.dim());
    }
    for (&o, seed) in plan.outputs.iter().zip_eq(adjoint_seeds) {
        adj[o] += seed;
    }

    let mut input_adjoints: Vec<Array2<T>> = plan.input_shapes.iter().map(|s| Array2::zeros(s.dim())).collect();
    for i in (0..n).rev() {
        let instr = &plan.instrs[i];
        let bar = std::mem::replace(&mut adj[i], Array2::zeros((0, 0)));
        let args = &instr.args;
        match &instr.kind {
            InstrKind::Input { position } => input_adjoints[*position] += &bar,
            InstrKind::Constant(_) => {}
            InstrKind::Add => {
                adj[args[0]] += &bar;
                adj[args[1]] += &bar;
            }
            InstrKind::Sub => {
                adj[args[0]] += &bar;
                adj[args[1]] -= &bar;
            }
            InstrKind::Neg => adj[args[0]] -= &bar,
            InstrKind::Mul => {
                let da = &bar * &vals[args[1]];
                let db = &bar * &vals[args[0]];
                adj[args[0]] += &da;
                adj[args[1]] += &db;
            }
            InstrKind::Scale(k) => adj[args[0]] += &(&bar * T::from_f64(*k)),
            InstrKind::MatMul => {
                let da = bar.dot(&vals[args[1]].t());
                let db = vals[args[0]].t().dot(&bar);
                adj[args[0]] += &da;
                adj[args[1]] += &db;
            }
            InstrKind::Transpose => adj[args[0]] += &bar.t(),
            InstrKind::Reshape => {
                let back = kernels::reshape(&bar, plan.instrs[args[0]].shape);
                adj[args[0]] += &back;
            }
            InstrKind::Vertcat => {
                let mut r0 = 0;
                for &a in args {
                    let rows = plan.instrs[a].shape.rows;
                    adj[a] += &bar.slice(ndarray::s![r0..r0 + rows, ..]);
                    r0 += rows;
                }
            }
            InstrKind::Horzcat => {
                let mut c0 = 0;
                for &a in args {
                    let cols = plan.instrs[a].shape.cols;
                    adj[a] += &bar.slice(ndarray::s![.., c0..c0 + cols]);
                    c0 += cols;
                }
            }
            InstrKind::Slice { rows, cols } => kernels::scatter_add(&mut adj[args[0]], bar.view(), rows, cols),
        }
    }

    Ok(Sensitivities {
        outputs,
        derivatives: input_adjoints,
    })
}

/// Dense Jacobian of output `output` with respect to input `input`, one forward sweep per
/// input element. Rows and columns follow the column-major vectorisation of the output and
/// input. Ports and bindings are checked up front, even when the input has no elements.
pub fn eval_jacobian<T: Scalar>(
    plan: &EvalPlan,
    inputs: &[ArrayView2<'_, T>],
    output: usize,
    input: usize,
    ctx: &mut DiffContext<T>,
) -> Result<Array2<T>> {
    if output >= plan.outputs.len() {
        return Err(ExprError::PortOutOfRange {
            what: "output",
            index: output,
            count: plan.outputs.len(),
        });
    }
    if input >= plan.input_shapes.len() {
        return Err(ExprError::PortOutOfRange {
            what: "input",
            index: input,
            count: plan.input_shapes.len(),
        });
    }
    check_bindings("input", &plan.input_shapes, inputs)?;

    let in_shape = plan.input_shapes[input];
    let out_shape = plan.instrs[plan.outputs[output]].shape;
    let zeros: Vec<Array2<T>> = plan.input_shapes.iter().map(|s| Array2::zeros(s.dim())).collect();

    let mut jac = Array2::zeros((out_shape.numel(), in_shape.numel()));
    for k in 0..in_shape.numel() {
        let seed = unit_seed::<T>(in_shape, k);
        let seeds: Vec<ArrayView2<'_, T>> = zeros
            .iter()
            .enumerate()
            .map(|(i, z)| if i == input { seed.view() } else { z.view() })
            .collect();
        let sens = eval_forward_into(plan, inputs, &seeds, ctx, &EvalOptions::default())?;
        let column = flatten_col_major(&sens.derivatives[output]);
        for (r, v) in column.into_iter().enumerate() {
            jac[[r, k]] = v;
        }
    }
    Ok(jac)
}
