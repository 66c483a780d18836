//! Service reference graph built with `petgraph`.
//!
//! Edges point from a service to the services its constructor needs, and
//! from an alias to its target. A cycle in this graph means the container
//! could never finish building one of the services involved.

use std::collections::{BTreeMap, HashMap, VecDeque};

use dicc_common::error::{DiccError, Result};
use petgraph::graph::NodeIndex;

use crate::builder::{ContainerBuilder, Entry};

/// Directed graph of constructor-time service references.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: petgraph::Graph<String, ()>,
    nodes: BTreeMap<String, NodeIndex>,
}

impl ReferenceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph for every entry of `builder`.
    #[must_use]
    pub fn from_builder(builder: &ContainerBuilder) -> Self {
        let mut graph = Self::new();
        for (id, entry) in builder.entries() {
            let _ = graph.add_service(id.as_str());
            match entry {
                Entry::Alias(target) => graph.add_reference(id.as_str(), target.as_str()),
                Entry::Definition(definition) => {
                    for reference in definition.constructor_references() {
                        graph.add_reference(id.as_str(), reference.as_str());
                    }
                }
            }
        }
        graph
    }

    /// Adds a service node, returning the existing one if already present.
    pub fn add_service(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.nodes.get(id) {
            return index;
        }
        let index = self.graph.add_node(id.to_owned());
        let _ = self.nodes.insert(id.to_owned(), index);
        index
    }

    /// Records that `from` needs `to` before it can be built.
    pub fn add_reference(&mut self, from: &str, to: &str) {
        let from = self.add_service(from);
        let to = self.add_service(to);
        let _ = self.graph.update_edge(from, to, ());
    }

    /// Ids `id` directly refers to, in sorted order.
    #[must_use]
    pub fn references_of(&self, id: &str) -> Vec<&str> {
        let Some(&index) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut refs: Vec<&str> = self
            .graph
            .neighbors(index)
            .filter_map(|n| self.graph.node_weight(n).map(String::as_str))
            .collect();
        refs.sort_unstable();
        refs
    }

    /// Fails if any service depends on itself, directly or not.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::CircularReference`] with one of the cycles.
    pub fn check(&self) -> Result<()> {
        tracing::debug!(nodes = self.graph.node_count(), "checking service references");
        let cyclic = petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .filter_map(|component| {
                component
                    .into_iter()
                    .min_by(|a, b| self.graph[*a].cmp(&self.graph[*b]))
            })
            .min_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        match cyclic {
            Some(start) => Err(DiccError::CircularReference {
                path: self.cycle_from(start),
            }),
            None => Ok(()),
        }
    }

    /// Returns ids so that every service comes after the ones it needs.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::CircularReference`] if the graph has a cycle.
    pub fn build_order(&self) -> Result<Vec<String>> {
        self.check()?;
        let sorted = petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            DiccError::CircularReference {
                path: self.cycle_from(cycle.node_id()),
            }
        })?;
        Ok(sorted
            .into_iter()
            .rev()
            .map(|index| self.graph[index].clone())
            .collect())
    }

    /// Shortest cycle through `start`, as ids ending with `start` again.
    fn cycle_from(&self, start: NodeIndex) -> Vec<String> {
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            let mut successors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
            successors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
            for next in successors {
                if next == start {
                    let mut path = vec![node];
                    let mut current = node;
                    while let Some(&prev) = parent.get(&current) {
                        path.push(prev);
                        current = prev;
                    }
                    path.reverse();
                    path.push(start);
                    return path.into_iter().map(|n| self.graph[n].clone()).collect();
                }
                if let std::collections::hash_map::Entry::Vacant(slot) = parent.entry(next) {
                    let _ = slot.insert(node);
                    queue.push_back(next);
                }
            }
        }

        vec![self.graph[start].clone()]
    }
}
