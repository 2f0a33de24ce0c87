// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Topological ordering over the node/edge sets the builder assembles.
//! Kahn's algorithm: it naturally reports *which* nodes are stuck in a
//! cycle (whatever is left over once every zero-indegree node has been
//! peeled off), which is exactly what [`crate::error::Error::Cyclic`] wants
//! to report.

use crate::node_key::NodeKey;
use indexmap::{IndexMap, IndexSet};

/// A directed edge set over a fixed node set, keyed by upstream node. Built
/// once per graph and consulted for both the forward (shutdown) and reverse
/// (instantiation) topological orders.
#[derive(Debug, Default, Clone)]
pub struct EdgeSet {
    nodes: IndexSet<NodeKey>,
    // upstream -> downstream
    forward: IndexMap<NodeKey, Vec<NodeKey>>,
}

impl EdgeSet {
    /// An edge set with no nodes or edges yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node with no edges, if not already present. Nodes must
    /// be registered before being referenced by an edge (receivers and
    /// exporters with no fan-out still need a presence in the topo order).
    pub fn add_node(&mut self, node: NodeKey) {
        self.nodes.insert(node);
        self.forward.entry(node).or_default();
    }

    /// Registers a directed edge `from -> to`. Both ends are implicitly
    /// registered as nodes.
    pub fn add_edge(&mut self, from: NodeKey, to: NodeKey) {
        self.add_node(from);
        self.add_node(to);
        let edges = self.forward.entry(from).or_default();
        if !edges.contains(&to) {
            edges.push(to);
        }
    }

    /// All registered nodes, in insertion order.
    #[must_use]
    pub fn nodes(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes.iter().copied()
    }

    /// The nodes `from` has an outgoing edge to.
    #[must_use]
    pub fn successors(&self, from: NodeKey) -> &[NodeKey] {
        self.forward.get(&from).map_or(&[], |v| v.as_slice())
    }

    /// A forward topological order: every node appears only after all of
    /// its upstream predecessors. Sources first, sinks last — the order
    /// `shutdown_all` walks the graph in.
    ///
    /// # Errors
    ///
    /// Returns the set of nodes that could not be ordered (every node
    /// reachable from a cycle) if the edge set is not a DAG.
    pub fn topological_order(&self) -> Result<Vec<NodeKey>, Vec<NodeKey>> {
        let mut indegree: IndexMap<NodeKey, usize> = self.nodes.iter().map(|&n| (n, 0)).collect();
        for edges in self.forward.values() {
            for &to in edges {
                *indegree.entry(to).or_insert(0) += 1;
            }
        }

        let mut ready: Vec<NodeKey> = indegree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&n, _)| n)
            .collect();
        // Deterministic order: walk `ready` in the node set's original
        // insertion order rather than whatever `IndexMap` iteration gave us.
        ready.sort_by_key(|n| self.nodes.get_index_of(n).unwrap_or(usize::MAX));

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut frontier = ready;
        while let Some(next) = frontier.pop() {
            order.push(next);
            let mut newly_ready = Vec::new();
            for &to in self.successors(next) {
                let deg = indegree.get_mut(&to).expect("successor must have an indegree entry");
                *deg -= 1;
                if *deg == 0 {
                    newly_ready.push(to);
                }
            }
            newly_ready.sort_by_key(|n| self.nodes.get_index_of(n).unwrap_or(usize::MAX));
            frontier.extend(newly_ready);
            frontier.sort_by_key(|n| std::cmp::Reverse(self.nodes.get_index_of(n).unwrap_or(usize::MAX)));
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            let ordered: IndexSet<NodeKey> = order.into_iter().collect();
            let stuck: Vec<NodeKey> = self.nodes.iter().filter(|n| !ordered.contains(*n)).copied().collect();
            Err(stuck)
        }
    }

    /// The reverse of [`Self::topological_order`]: sinks first, sources
    /// last — the order the builder instantiates components in, so that a
    /// node's downstream consumer always exists before the node itself is
    /// constructed.
    ///
    /// # Errors
    ///
    /// Same failure mode as [`Self::topological_order`].
    pub fn reverse_topological_order(&self) -> Result<Vec<NodeKey>, Vec<NodeKey>> {
        let mut order = self.topological_order()?;
        order.reverse();
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> NodeKey {
        // NodeKey has no public raw constructor; derive distinct keys via
        // distinct receiver signal/id discriminants instead.
        use pgraph_config::{ComponentId, SignalKind};
        let signal = match n % 3 {
            0 => SignalKind::Traces,
            1 => SignalKind::Metrics,
            _ => SignalKind::Logs,
        };
        NodeKey::receiver(&ComponentId::new("probe", n.to_string()), signal)
    }

    #[test]
    fn linear_chain_orders_sources_first() {
        let (a, b, c) = (key(0), key(1), key(2));
        let mut edges = EdgeSet::new();
        edges.add_edge(a, b);
        edges.add_edge(b, c);
        let order = edges.topological_order().unwrap();
        assert_eq!(order, vec![a, b, c]);
        let reverse = edges.reverse_topological_order().unwrap();
        assert_eq!(reverse, vec![c, b, a]);
    }

    #[test]
    fn shared_sink_appears_once() {
        let (a, b, sink) = (key(0), key(1), key(2));
        let mut edges = EdgeSet::new();
        edges.add_edge(a, sink);
        edges.add_edge(b, sink);
        let order = edges.topological_order().unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(*order.last().unwrap(), sink);
    }

    #[test]
    fn cycle_is_reported_with_its_nodes() {
        let (a, b) = (key(0), key(1));
        let mut edges = EdgeSet::new();
        edges.add_edge(a, b);
        edges.add_edge(b, a);
        let stuck = edges.topological_order().unwrap_err();
        assert_eq!(stuck.len(), 2);
    }
}
