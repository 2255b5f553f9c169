use core::fmt;
use std::collections::HashMap;

use crate::error::Result;
use crate::graph::ExprGraph;
use crate::node::{ExprId, Op};
use crate::node_utils::topological_order;
use crate::shape::Shape;

fn strip_outer_parens(mut s: &str) -> &str {
    loop {
        let bytes = s.as_bytes();
        if bytes.len() < 2 || bytes[0] != b'(' || bytes[bytes.len() - 1] != b')' {
            return s;
        }

        let mut depth = 0i32;
        let mut encloses_all = false;
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        encloses_all = i == bytes.len() - 1;
                        break;
                    }
                }
                _ => {}
            }
        }

        if !encloses_all {
            return s;
        }
        s = &s[1..s.len() - 1];
    }
}

fn call(name: &str, args: &[&str]) -> String {
    let mut out = String::from(name);
    out.push('(');
    for (i, a) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(strip_outer_parens(a));
    }
    out.push(')');
    out
}

/// Render resolved positions along an extent of `dim` as the shortest index expression. Only a
/// `single` index prints as a bare position; a one-element range keeps its `start:stop` form.
fn string_positions(positions: &[usize], dim: usize, single: bool) -> String {
    match positions {
        [] => "[]".to_string(),
        [i] if single => i.to_string(),
        [i] if *i == 0 && dim == 1 => ":".to_string(),
        [i] => format!("{i}:{}", i + 1),
        [first, second, ..] => {
            let step = *second as isize - *first as isize;
            let progression = step > 0 && positions.windows(2).all(|w| w[1] as isize - w[0] as isize == step);
            if !progression {
                let items: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
                return format!("[{}]", items.join(","));
            }
            let stop = positions[positions.len() - 1] + 1;
            match step {
                1 if *first == 0 && stop == dim => ":".to_string(),
                1 => format!("{first}:{stop}"),
                _ => format!("{first}:{stop}:{step}"),
            }
        }
    }
}

/// Human-readable rendering of `root`.
///
/// Shared subexpressions are printed once per use, so the result grows with the tree size of
/// `root`, not with its number of distinct nodes.
pub fn string_expr(graph: &ExprGraph, root: ExprId) -> Result<String> {
    let order = topological_order(graph, &[root])?;
    let mut rendered: HashMap<ExprId, String> = HashMap::with_capacity(order.len());

    for id in order {
        let node = graph.node(id)?;
        let args: Vec<&str> = node.args.iter().map(|a| rendered[a].as_str()).collect();
        let s = match &node.op {
            Op::Symbol { name } => name.clone(),
            Op::Constant(v) if node.shape == Shape::scalar() => v[[0, 0]].to_string(),
            Op::Constant(_) => format!("const({})", node.shape),
            Op::Add => format!("({}+{})", args[0], args[1]),
            Op::Sub => format!("({}-{})", args[0], args[1]),
            Op::Mul => format!("({}*{})", args[0], args[1]),
            Op::Neg => format!("(-{})", args[0]),
            Op::Scale(k) => format!("({k}*{})", args[0]),
            Op::MatMul => call("mtimes", &args),
            Op::Transpose => format!("{}'", args[0]),
            Op::Reshape => {
                let shape = node.shape.to_string();
                call("reshape", &[args[0], shape.as_str()])
            }
            Op::Vertcat => call("vertcat", &args),
            Op::Horzcat => call("horzcat", &args),
            Op::Slice { rows, cols, single } => {
                let base = graph.shape(node.args[0])?;
                format!(
                    "{}({},{})",
                    args[0],
                    string_positions(rows, base.rows, single.0),
                    string_positions(cols, base.cols, single.1)
                )
            }
        };
        rendered.insert(id, s);
    }

    Ok(strip_outer_parens(&rendered[&root]).to_string())
}

/// [`fmt::Display`] adapter returned by [`ExprGraph::display`].
pub struct DisplayExpr<'a> {
    graph: &'a ExprGraph,
    id: ExprId,
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match string_expr(self.graph, self.id) {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "<{e}>"),
        }
    }
}

impl ExprGraph {
    pub fn display(&self, id: ExprId) -> DisplayExpr<'_> {
        DisplayExpr { graph: self, id }
    }
}
