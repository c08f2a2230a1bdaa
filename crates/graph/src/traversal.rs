//! Topological layering and cycle detection.
//!
//! Layers are computed by repeatedly extracting every module whose
//! dependencies have all been extracted already. Whatever cannot be extracted
//! sits on or behind a cycle.

use crate::{ModuleGraph, ModuleNodeData};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Modules grouped by dependency depth, plus any cycles found.
///
/// Layer 0 contains modules with no dependencies inside the graph. Every
/// module in layer N depends only on modules in layers below N, so modules in
/// the same layer are independent of one another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layering {
    /// Layers of module names, each sorted.
    pub layers: Vec<Vec<String>>,
    /// Cycles, each as a sorted list of its members, ordered by first member.
    pub cycles: Vec<Vec<String>>,
    /// Modules that could not be layered because they sit on or depend on a cycle.
    pub unlayered: Vec<String>,
}

impl Layering {
    /// Sorted names of every module that participates in a cycle.
    #[must_use]
    pub fn circular_dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cycles.iter().flatten().cloned().collect();
        names.sort();
        names.dedup();
        names
    }

    /// Whether the whole graph was layered without hitting a cycle.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Layers flattened into a single dependency-first order.
    #[must_use]
    pub fn flatten(&self) -> Vec<String> {
        self.layers.iter().flatten().cloned().collect()
    }
}

impl<T: ModuleNodeData> ModuleGraph<T> {
    /// Compute dependency layers, reporting cycles instead of failing.
    #[must_use]
    pub fn layers(&self) -> Layering {
        let graph = self.inner();

        let mut remaining_deps: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|idx| {
                (
                    idx,
                    graph.neighbors_directed(idx, Direction::Outgoing).count(),
                )
            })
            .collect();

        let mut current: Vec<NodeIndex> = remaining_deps
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&idx, _)| idx)
            .collect();

        let mut layers = Vec::new();
        let mut extracted = 0;

        while !current.is_empty() {
            let mut next = Vec::new();
            for &idx in &current {
                for dependent in graph.neighbors_directed(idx, Direction::Incoming) {
                    if let Some(count) = remaining_deps.get_mut(&dependent) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent);
                        }
                    }
                }
            }

            extracted += current.len();
            let mut names: Vec<String> = current.iter().map(|&idx| graph[idx].name.clone()).collect();
            names.sort();
            layers.push(names);
            current = next;
        }

        if extracted == graph.node_count() {
            return Layering {
                layers,
                cycles: Vec::new(),
                unlayered: Vec::new(),
            };
        }

        let mut unlayered: Vec<String> = remaining_deps
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&idx, _)| graph[idx].name.clone())
            .collect();
        unlayered.sort();

        let mut cycles: Vec<Vec<String>> = tarjan_scc(graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut names: Vec<String> =
                    component.iter().map(|&idx| graph[idx].name.clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();

        warn!(
            cycles = cycles.len(),
            unlayered = unlayered.len(),
            "Module dependency graph contains cycles"
        );

        Layering {
            layers,
            cycles,
            unlayered,
        }
    }
}
