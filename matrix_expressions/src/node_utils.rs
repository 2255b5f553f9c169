use crate::error::Result;
use crate::graph::ExprGraph;
use crate::node::ExprId;

/// Every node reachable from `roots`, operands before users, each node exactly once.
///
/// Roots are visited in order and operands left to right, so the order is deterministic.
pub fn topological_order(graph: &ExprGraph, roots: &[ExprId]) -> Result<Vec<ExprId>> {
    let mut done = vec![false; graph.len()];
    let mut order: Vec<ExprId> = Vec::new();
    let mut stack: Vec<(ExprId, bool)> = Vec::with_capacity(roots.len());
    for &r in roots.iter().rev() {
        graph.node(r)?;
        stack.push((r, false));
    }

    while let Some((id, expanded)) = stack.pop() {
        if done[id.index()] {
            continue;
        }
        let node = graph.node(id)?;
        if expanded {
            done[id.index()] = true;
            order.push(id);
        } else {
            stack.push((id, true));
            for &a in node.args.iter().rev() {
                if !done[a.index()] {
                    stack.push((a, false));
                }
            }
        }
    }
    Ok(order)
}

/// Symbols reachable from `roots`, in topological order.
pub fn free_symbols(graph: &ExprGraph, roots: &[ExprId]) -> Result<Vec<ExprId>> {
    Ok(topological_order(graph, roots)?
        .into_iter()
        .filter(|&id| graph.is_symbol(id))
        .collect())
}

pub fn depends_on(graph: &ExprGraph, expr: ExprId, symbol: ExprId) -> Result<bool> {
    graph.node(symbol)?;
    Ok(topological_order(graph, &[expr])?.contains(&symbol))
}

/// Number of distinct nodes reachable from `root`.
pub fn count_nodes(graph: &ExprGraph, root: ExprId) -> Result<usize> {
    Ok(topological_order(graph, &[root])?.len())
}

/// Number of nodes `root` would have if every shared operand were duplicated, saturating at
/// `usize::MAX`.
pub fn count_tree_nodes(graph: &ExprGraph, root: ExprId) -> Result<usize> {
    tree_mapreduce(graph, root, |_| 1usize, |children| {
        children.iter().fold(1usize, |acc, &c| acc.saturating_add(c))
    })
}

/// Longest operand chain below `root`, counting a leaf as depth 1.
pub fn depth(graph: &ExprGraph, root: ExprId) -> Result<usize> {
    tree_mapreduce(graph, root, |_| 1usize, |children| {
        children.iter().copied().max().unwrap_or(0) + 1
    })
}

/// Fold over the DAG below `root`, computing each shared node once.
pub fn tree_mapreduce<R: Clone>(
    graph: &ExprGraph,
    root: ExprId,
    mut f_leaf: impl FnMut(ExprId) -> R,
    mut op: impl FnMut(&[R]) -> R,
) -> Result<R> {
    let order = topological_order(graph, &[root])?;
    let mut values: Vec<Option<R>> = vec![None; graph.len()];
    let mut children: Vec<R> = Vec::new();
    for id in order {
        let node = graph.node(id)?;
        let v = if node.args.is_empty() {
            f_leaf(id)
        } else {
            children.clear();
            children.extend(node.args.iter().filter_map(|a| values[a.index()].clone()));
            op(&children)
        };
        values[id.index()] = Some(v);
    }
    Ok(values[root.index()]
        .take()
        .unwrap_or_else(|| unreachable!("root is last in its own topological order")))
}
