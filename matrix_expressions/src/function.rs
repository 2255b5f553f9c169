use ndarray::{Array2, ArrayView2};

use crate::compile::{CompileOptions, EvalPlan, compile_plan};
use crate::error::Result;
use crate::evaluate::{EvalContext, EvalOptions, eval_plan_into};
use crate::evaluate_derivative::{DiffContext, Sensitivities, eval_forward_into, eval_jacobian, eval_reverse_into};
use crate::graph::ExprGraph;
use crate::node::ExprId;
use crate::shape::Shape;
use crate::traits::Scalar;

/// An ordered list of input symbols bound to an ordered list of output expressions.
///
/// Construction compiles the reachable part of the graph into an [`EvalPlan`], so a `Function`
/// no longer borrows its graph and can be evaluated any number of times, from any number of
/// threads. The bound ids stay available through [`Function::inputs`] and
/// [`Function::outputs`] for building larger expressions in the same graph.
#[derive(Clone, Debug)]
pub struct Function {
    inputs: Vec<ExprId>,
    outputs: Vec<ExprId>,
    plan: EvalPlan,
}

impl Function {
    pub fn new(graph: &ExprGraph, inputs: &[ExprId], outputs: &[ExprId]) -> Result<Self> {
        Self::with_options(graph, inputs, outputs, &CompileOptions::default())
    }

    pub fn with_options(
        graph: &ExprGraph,
        inputs: &[ExprId],
        outputs: &[ExprId],
        opts: &CompileOptions,
    ) -> Result<Self> {
        let plan = compile_plan(graph, inputs, outputs, opts)?;
        Ok(Self {
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            plan,
        })
    }

    pub fn n_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn inputs(&self) -> &[ExprId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ExprId] {
        &self.outputs
    }

    pub fn input(&self, i: usize) -> Option<ExprId> {
        self.inputs.get(i).copied()
    }

    pub fn output(&self, i: usize) -> Option<ExprId> {
        self.outputs.get(i).copied()
    }

    pub fn input_shape(&self, i: usize) -> Option<Shape> {
        self.plan.input_shapes.get(i).copied()
    }

    pub fn output_shape(&self, i: usize) -> Option<Shape> {
        self.plan.outputs.get(i).map(|&o| self.plan.instrs[o].shape)
    }

    pub fn plan(&self) -> &EvalPlan {
        &self.plan
    }

    pub fn call<T: Scalar>(&self, inputs: &[ArrayView2<'_, T>]) -> Result<Vec<Array2<T>>> {
        self.call_with(inputs, &mut EvalContext::new(), &EvalOptions::default())
    }

    pub fn call_with<T: Scalar>(
        &self,
        inputs: &[ArrayView2<'_, T>],
        ctx: &mut EvalContext<T>,
        opts: &EvalOptions,
    ) -> Result<Vec<Array2<T>>> {
        eval_plan_into(&self.plan, inputs, ctx, opts)
    }

    /// Outputs and their directional derivatives along `seeds` (one per input).
    pub fn forward<T: Scalar>(
        &self,
        inputs: &[ArrayView2<'_, T>],
        seeds: &[ArrayView2<'_, T>],
    ) -> Result<Sensitivities<T>> {
        eval_forward_into(&self.plan, inputs, seeds, &mut DiffContext::new(), &EvalOptions::default())
    }

    /// Outputs and the input adjoints for `adjoint_seeds` (one per output).
    pub fn reverse<T: Scalar>(
        &self,
        inputs: &[ArrayView2<'_, T>],
        adjoint_seeds: &[ArrayView2<'_, T>],
    ) -> Result<Sensitivities<T>> {
        eval_reverse_into(
            &self.plan,
            inputs,
            adjoint_seeds,
            &mut DiffContext::new(),
            &EvalOptions::default(),
        )
    }

    /// Dense Jacobian of `output` with respect to `input` at `inputs`.
    pub fn jacobian<T: Scalar>(&self, inputs: &[ArrayView2<'_, T>], output: usize, input: usize) -> Result<Array2<T>> {
        eval_jacobian(&self.plan, inputs, output, input, &mut DiffContext::new())
    }
}
