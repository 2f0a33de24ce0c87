// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! [`Pipelines`]: the built graph's runtime handle — start/shutdown drivers
//! plus the enumeration surface over receivers, exporters, and per-pipeline
//! views.

use crate::component::{ExporterComponent, ReceiverComponent};
use crate::context::{Context, Host};
use crate::error::Error;
use crate::node::Node;
use crate::node_key::NodeKey;
use indexmap::IndexMap;
use pgraph_config::{ComponentId, PipelineId, SignalKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-pipeline view returned by [`Pipelines::pipelines`]: the aggregate
/// mutation flag and the role-grouped node key lists belonging to that
/// pipeline, for reporting and diagnostics.
#[derive(Debug, Clone)]
pub struct PipelineView {
    mutates_data: bool,
    receivers: Vec<NodeKey>,
    processors: Vec<NodeKey>,
    exporters: Vec<NodeKey>,
}

impl PipelineView {
    pub(crate) fn new(
        mutates_data: bool,
        receivers: Vec<NodeKey>,
        processors: Vec<NodeKey>,
        exporters: Vec<NodeKey>,
    ) -> Self {
        Self {
            mutates_data,
            receivers,
            processors,
            exporters,
        }
    }

    /// The OR of `mutates_data` over every processor in this pipeline (see
    /// invariant 5 in the design: this is also what the pipeline's
    /// capabilities node reports upstream).
    #[must_use]
    pub fn mutates_data(&self) -> bool {
        self.mutates_data
    }

    /// Node keys occupying a receiver-list position in this pipeline
    /// (including connector-as-receiver nodes).
    #[must_use]
    pub fn receivers(&self) -> &[NodeKey] {
        &self.receivers
    }

    /// Node keys of this pipeline's private processor chain.
    #[must_use]
    pub fn processors(&self) -> &[NodeKey] {
        &self.processors
    }

    /// Node keys occupying an exporter-list position in this pipeline
    /// (including connector-as-exporter nodes).
    #[must_use]
    pub fn exporters(&self) -> &[NodeKey] {
        &self.exporters
    }
}

/// The fully built, instantiated graph: every node constructed and wired,
/// ready to be started. Returned by [`crate::graph::build`].
pub struct Pipelines {
    arena: IndexMap<NodeKey, Arc<Node>>,
    /// Forward topological order: producers before consumers (receivers
    /// first). `shutdown_all` walks this order; `start_all` walks it in
    /// reverse.
    forward_order: Vec<NodeKey>,
    /// Topological level of each node (longest path from a source),
    /// retained so a future scheduler could start/stop same-level nodes
    /// concurrently without recomputing topology (see the design notes on
    /// level-parallelism).
    levels: HashMap<NodeKey, usize>,
    views: IndexMap<PipelineId, PipelineView>,
    receivers: HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn ReceiverComponent>>>,
    exporters: HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn ExporterComponent>>>,
}

impl Pipelines {
    pub(crate) fn new(
        arena: IndexMap<NodeKey, Arc<Node>>,
        forward_order: Vec<NodeKey>,
        levels: HashMap<NodeKey, usize>,
        views: IndexMap<PipelineId, PipelineView>,
        receivers: HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn ReceiverComponent>>>,
        exporters: HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn ExporterComponent>>>,
    ) -> Self {
        Self {
            arena,
            forward_order,
            levels,
            views,
            receivers,
            exporters,
        }
    }

    /// Starts every node in reverse topological order (sinks first), so
    /// that when a source starts it already has somewhere to emit. Stops at
    /// the first error and returns it; already-started nodes are left
    /// running (rolling them back is the caller's responsibility, typically
    /// by calling [`Self::shutdown_all`]).
    pub fn start_all(&self, ctx: &Context, host: &dyn Host) -> Result<(), Error> {
        for key in self.forward_order.iter().rev() {
            self.arena[key].start(ctx, host)?;
        }
        Ok(())
    }

    /// Shuts every node down in forward topological order (sources first),
    /// so that no data enters a component after its shutdown begins.
    /// Attempts every node even after a failure; returns the first error
    /// observed and logs the rest at `error` level.
    pub fn shutdown_all(&self, ctx: &Context) -> Result<(), Error> {
        let mut first_error = None;
        for key in &self.forward_order {
            if let Err(err) = self.arena[key].shutdown(ctx) {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::error!(node = %key, error = %err, "additional shutdown error");
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True receiver nodes (never connector-as-receiver), grouped by the
    /// signal kind they emit and deduplicated across pipelines.
    #[must_use]
    pub fn receivers(&self) -> &HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn ReceiverComponent>>> {
        &self.receivers
    }

    /// True exporter nodes (never connector-as-exporter), grouped by the
    /// signal kind they drain and deduplicated across pipelines.
    #[must_use]
    pub fn exporters(&self) -> &HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn ExporterComponent>>> {
        &self.exporters
    }

    /// Per-pipeline views, in the order pipelines were declared.
    #[must_use]
    pub fn pipelines(&self) -> &IndexMap<PipelineId, PipelineView> {
        &self.views
    }

    /// The topological level of `key` (0 for a node with no predecessors),
    /// or `None` if `key` is not part of this graph.
    #[must_use]
    pub fn level_of(&self, key: NodeKey) -> Option<usize> {
        self.levels.get(&key).copied()
    }

    /// The total number of nodes in the built graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }
}
