//! The fixed-point analysis.
//!
//! A depth-first traversal from the function root carries immutable
//! knowledge snapshots through the graph. Each node accumulates the union
//! of everything that reached it; memoization on `(node, knowledge)` both
//! accelerates convergence and guarantees termination, since the lattice
//! is finite for any set of visible locals.

use petgraph::graph::NodeIndex;
use rustc_hash::FxHashSet;

use super::graph::{Effect, FuncFlow};
use super::lattice::Knowledge;

pub(crate) fn analyze(flow: &mut FuncFlow) {
    let mut memo: FxHashSet<(NodeIndex, Knowledge)> = FxHashSet::default();
    let mut stack: Vec<(NodeIndex, Knowledge)> = vec![(flow.root, Knowledge::new())];

    while let Some((index, knowledge)) = stack.pop() {
        if !memo.insert((index, knowledge.clone())) {
            continue;
        }

        let effect = flow.graph[index].effect;
        let mut k = knowledge;
        let mut blocked = false;

        match effect {
            Effect::Plain => {}
            Effect::Blocker => blocked = true,
            Effect::Assign(symbol, value) => k.set(symbol, value),
            Effect::Alias(dst, src) => {
                let value = k.get(src);
                k.set(dst, value);
            }
            Effect::Check(symbol, value) => {
                let narrowed = k.get(symbol) & value;
                if narrowed.is_empty() {
                    // Contradiction: this path cannot happen.
                    continue;
                }
                k.set(symbol, narrowed);
            }
        }

        match &mut flow.graph[index].knowledge {
            slot @ None => *slot = Some(k.clone()),
            Some(accumulated) => accumulated.union_with(&k),
        }

        if blocked {
            continue;
        }
        let successors: Vec<_> = flow.graph.neighbors(index).collect();
        for succ in successors {
            stack.push((succ, k.clone()));
        }
    }
}
