use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{ExprError, Result};
use crate::graph::ExprGraph;
use crate::node::{ExprId, Op};
use crate::node_utils::topological_order;
use crate::shape::Shape;

#[derive(Copy, Clone, Debug)]
pub struct CompileOptions {
    /// Recycle a scratch slot once the last consumer of its value has run.
    pub reuse_slots: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { reuse_slots: true }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InstrKind {
    Input { position: usize },
    Constant(Array2<f64>),
    Add,
    Sub,
    Mul,
    Neg,
    Scale(f64),
    MatMul,
    Transpose,
    Reshape,
    Vertcat,
    Horzcat,
    Slice { rows: Vec<usize>, cols: Vec<usize> },
}

impl InstrKind {
    /// Whether the instruction is linear in its operands, so that tangents propagate through
    /// the same kernel as values.
    pub fn is_linear(&self) -> bool {
        !matches!(
            self,
            InstrKind::Input { .. } | InstrKind::Constant(_) | InstrKind::Mul | InstrKind::MatMul
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instr {
    pub kind: InstrKind,
    /// Operands, as positions in [`EvalPlan::instrs`].
    pub args: Vec<usize>,
    pub shape: Shape,
    /// Scratch slot holding the result.
    pub dst: usize,
}

/// A function body lowered to straight-line code.
///
/// Every reachable node appears exactly once and after its operands, so a single pass over
/// `instrs` evaluates the whole DAG with each shared subexpression computed once.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalPlan {
    pub instrs: Vec<Instr>,
    pub n_slots: usize,
    pub input_shapes: Vec<Shape>,
    /// Instruction producing each output.
    pub outputs: Vec<usize>,
}

impl EvalPlan {
    pub fn output_shapes(&self) -> impl Iterator<Item = Shape> + '_ {
        self.outputs.iter().map(|&o| self.instrs[o].shape)
    }
}

/// Lower the subgraph reachable from `outputs` into an [`EvalPlan`].
///
/// Fails if an input is not a symbol or is listed twice, or if any output depends on a symbol
/// that is not among `inputs`.
pub fn compile_plan(
    graph: &ExprGraph,
    inputs: &[ExprId],
    outputs: &[ExprId],
    opts: &CompileOptions,
) -> Result<EvalPlan> {
    let mut input_position: HashMap<ExprId, usize> = HashMap::with_capacity(inputs.len());
    let mut input_shapes = Vec::with_capacity(inputs.len());
    for (position, &id) in inputs.iter().enumerate() {
        let node = graph.node(id)?;
        let Op::Symbol { name } = &node.op else {
            return Err(ExprError::NotASymbol { position });
        };
        if input_position.insert(id, position).is_some() {
            return Err(ExprError::DuplicateInput { name: name.clone() });
        }
        input_shapes.push(node.shape);
    }

    let order = topological_order(graph, outputs)?;
    let mut instr_of: HashMap<ExprId, usize> = HashMap::with_capacity(order.len());
    let mut instrs: Vec<Instr> = Vec::with_capacity(order.len());

    for id in order {
        let node = graph.node(id)?;
        let kind = match &node.op {
            Op::Symbol { name } => match input_position.get(&id) {
                Some(&position) => InstrKind::Input { position },
                None => return Err(ExprError::UnboundSymbol { name: name.clone() }),
            },
            Op::Constant(v) => InstrKind::Constant(v.clone()),
            Op::Add => InstrKind::Add,
            Op::Sub => InstrKind::Sub,
            Op::Mul => InstrKind::Mul,
            Op::Neg => InstrKind::Neg,
            Op::Scale(k) => InstrKind::Scale(*k),
            Op::MatMul => InstrKind::MatMul,
            Op::Transpose => InstrKind::Transpose,
            Op::Reshape => InstrKind::Reshape,
            Op::Vertcat => InstrKind::Vertcat,
            Op::Horzcat => InstrKind::Horzcat,
            Op::Slice { rows, cols, .. } => InstrKind::Slice {
                rows: rows.clone(),
                cols: cols.clone(),
            },
        };
        let args = node.args.iter().map(|a| instr_of[a]).collect();
        instr_of.insert(id, instrs.len());
        instrs.push(Instr {
            kind,
            args,
            shape: node.shape,
            dst: instrs.len(),
        });
    }

    let outputs: Vec<usize> = outputs.iter().map(|o| instr_of[o]).collect();
    let n_slots = if opts.reuse_slots {
        assign_slots(&mut instrs, &outputs)
    } else {
        instrs.len()
    };

    log::debug!(
        "compiled plan: {} instructions, {} slots, {} inputs, {} outputs",
        instrs.len(),
        n_slots,
        input_shapes.len(),
        outputs.len()
    );

    Ok(EvalPlan {
        instrs,
        n_slots,
        input_shapes,
        outputs,
    })
}

/// Give each instruction a destination slot, recycling slots whose value is dead.
///
/// A slot is released only after the instruction that reads it for the last time has been
/// given its own destination, so no instruction writes over one of its operands. Output values
/// are never released.
fn assign_slots(instrs: &mut [Instr], outputs: &[usize]) -> usize {
    let mut last_use: Vec<usize> = (0..instrs.len()).collect();
    for (i, instr) in instrs.iter().enumerate() {
        for &a in &instr.args {
            last_use[a] = i;
        }
    }
    for &o in outputs {
        last_use[o] = usize::MAX;
    }

    let mut free_slots: Vec<usize> = Vec::new();
    let mut n_slots = 0usize;
    let mut released: Vec<usize> = Vec::new();

    for i in 0..instrs.len() {
        let dst = free_slots.pop().unwrap_or_else(|| {
            n_slots += 1;
            n_slots - 1
        });
        instrs[i].dst = dst;

        released.clear();
        released.extend(instrs[i].args.iter().copied().filter(|&a| last_use[a] == i));
        released.sort_unstable();
        released.dedup();
        free_slots.extend(released.iter().map(|&a| instrs[a].dst));

        // A value nobody reads is dead as soon as it is written.
        if last_use[i] == i {
            free_slots.push(dst);
        }
    }
    n_slots
}
