// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The graph builder: turns a [`PipelinesConfig`] plus factory/settings
//! registries into a fully instantiated, wired [`Pipelines`]. See §4.3 of
//! the design for the algorithm this follows step by step.

use crate::component::{ComponentSettings, Factories, SettingsRegistry};
use crate::consumer::{Consumer, Splitter};
use crate::error::{ConsumeError, Error};
use crate::node::{CapabilitiesNode, Node};
use crate::node_key::NodeKey;
use crate::pipelines::{PipelineView, Pipelines};
use crate::topo::EdgeSet;
use indexmap::{IndexMap, IndexSet};
use pgraph_config::{ComponentId, PipelineId, PipelinesConfig, SignalKind};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

enum NodeSpec {
    Receiver {
        id: ComponentId,
        signal: SignalKind,
    },
    Processor {
        id: ComponentId,
        pipeline: PipelineId,
        signal: SignalKind,
    },
    Exporter {
        id: ComponentId,
        signal: SignalKind,
    },
    Connector {
        id: ComponentId,
        from: SignalKind,
        to: SignalKind,
    },
    Capabilities {
        pipeline: PipelineId,
    },
    FanOut {
        pipeline: PipelineId,
    },
}

/// Builds the graph described by `pipelines_config`, instantiating every
/// component via `factories` and `component_configs`.
///
/// # Errors
///
/// Returns an error at the first point of failure: pipeline shape
/// validation, a cycle in the node/edge set, or a node that fails to
/// instantiate (missing factory, missing settings, unsupported signal kind,
/// or the factory's own `build` call failing).
pub fn build(
    pipelines_config: &PipelinesConfig,
    component_configs: &SettingsRegistry,
    factories: &Factories,
) -> Result<Pipelines, Error> {
    for (pipeline_id, cfg) in pipelines_config {
        cfg.validate(pipeline_id)?;
    }

    let connector_ids = connector_component_ids(pipelines_config);
    let (connector_from, connector_to) = connector_signal_kinds(pipelines_config, &connector_ids);

    let mut specs: IndexMap<NodeKey, NodeSpec> = IndexMap::new();
    let mut edges = EdgeSet::new();
    let mut pipeline_receivers: IndexMap<PipelineId, Vec<NodeKey>> = IndexMap::new();
    let mut pipeline_processors: IndexMap<PipelineId, Vec<NodeKey>> = IndexMap::new();
    let mut pipeline_exporters: IndexMap<PipelineId, Vec<NodeKey>> = IndexMap::new();

    for (pipeline_id, cfg) in pipelines_config {
        let signal = pipeline_id.signal();
        let capabilities_key = NodeKey::capabilities(pipeline_id);
        specs
            .entry(capabilities_key)
            .or_insert_with(|| NodeSpec::Capabilities { pipeline: pipeline_id.clone() });
        edges.add_node(capabilities_key);

        let fan_out_key = NodeKey::fan_out(pipeline_id);
        specs
            .entry(fan_out_key)
            .or_insert_with(|| NodeSpec::FanOut { pipeline: pipeline_id.clone() });
        edges.add_node(fan_out_key);

        let mut recv_keys = Vec::with_capacity(cfg.receivers.len());
        for id in &cfg.receivers {
            if connector_ids.contains(id) {
                let to = signal;
                for &from in connector_from.get(id).into_iter().flatten() {
                    let key = NodeKey::connector(id, from, to);
                    specs
                        .entry(key)
                        .or_insert_with(|| NodeSpec::Connector { id: id.clone(), from, to });
                    edges.add_edge(key, capabilities_key);
                    recv_keys.push(key);
                }
            } else {
                let key = NodeKey::receiver(id, signal);
                specs.entry(key).or_insert_with(|| NodeSpec::Receiver { id: id.clone(), signal });
                edges.add_edge(key, capabilities_key);
                recv_keys.push(key);
            }
        }
        pipeline_receivers.insert(pipeline_id.clone(), recv_keys);

        let mut upstream = capabilities_key;
        let mut proc_keys = Vec::with_capacity(cfg.processors.len());
        for id in &cfg.processors {
            let key = NodeKey::processor(id, pipeline_id);
            specs.entry(key).or_insert_with(|| NodeSpec::Processor {
                id: id.clone(),
                pipeline: pipeline_id.clone(),
                signal,
            });
            edges.add_edge(upstream, key);
            proc_keys.push(key);
            upstream = key;
        }
        edges.add_edge(upstream, fan_out_key);
        pipeline_processors.insert(pipeline_id.clone(), proc_keys);

        let mut exp_keys = Vec::with_capacity(cfg.exporters.len());
        for id in &cfg.exporters {
            if connector_ids.contains(id) {
                let from = signal;
                for &to in connector_to.get(id).into_iter().flatten() {
                    let key = NodeKey::connector(id, from, to);
                    specs
                        .entry(key)
                        .or_insert_with(|| NodeSpec::Connector { id: id.clone(), from, to });
                    edges.add_edge(fan_out_key, key);
                    exp_keys.push(key);
                }
            } else {
                let key = NodeKey::exporter(id, signal);
                specs.entry(key).or_insert_with(|| NodeSpec::Exporter { id: id.clone(), signal });
                edges.add_edge(fan_out_key, key);
                exp_keys.push(key);
            }
        }
        pipeline_exporters.insert(pipeline_id.clone(), exp_keys);
    }

    let forward_order = edges.topological_order().map_err(|stuck| Error::Cyclic { count: stuck.len() })?;
    let levels = compute_levels(&edges, &forward_order);

    let mut arena: IndexMap<NodeKey, Arc<Node>> = IndexMap::with_capacity(specs.len());
    let mut true_receivers: HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn crate::component::ReceiverComponent>>> =
        HashMap::new();
    let mut true_exporters: HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn crate::component::ExporterComponent>>> =
        HashMap::new();

    for &key in forward_order.iter().rev() {
        let spec = specs.get(&key).expect("every topo-ordered key has a spec");
        let node = instantiate(
            key,
            spec,
            &arena,
            &edges,
            component_configs,
            factories,
            &pipeline_processors,
            &mut true_receivers,
            &mut true_exporters,
        )?;
        tracing::debug!(node_key = %key, role = %node.role(), "constructed node");
        arena.insert(key, node);
    }

    let mut views: IndexMap<PipelineId, PipelineView> = IndexMap::with_capacity(pipelines_config.len());
    for pipeline_id in pipelines_config.keys() {
        let receivers = pipeline_receivers.shift_remove(pipeline_id).unwrap_or_default();
        let processors = pipeline_processors.shift_remove(pipeline_id).unwrap_or_default();
        let exporters = pipeline_exporters.shift_remove(pipeline_id).unwrap_or_default();
        let mutates = processors.iter().any(|k| arena[k].mutates_data());
        views.insert(pipeline_id.clone(), PipelineView::new(mutates, receivers, processors, exporters));
    }

    Ok(Pipelines::new(arena, forward_order, levels, views, true_receivers, true_exporters))
}

/// A component id is treated as a connector iff it appears in at least one
/// pipeline's receiver list *and* at least one pipeline's exporter list
/// (possibly the same pipeline, which is how a loop-back connector cycle is
/// expressed). This mirrors the source ecosystem's convention of declaring
/// connectors in a dedicated config section, inferred here since this
/// crate's config model carries only per-pipeline receiver/exporter lists.
fn connector_component_ids(pipelines_config: &PipelinesConfig) -> HashSet<ComponentId> {
    let mut receiver_ids = HashSet::new();
    let mut exporter_ids = HashSet::new();
    for cfg in pipelines_config.values() {
        receiver_ids.extend(cfg.receivers.iter().cloned());
        exporter_ids.extend(cfg.exporters.iter().cloned());
    }
    receiver_ids.intersection(&exporter_ids).cloned().collect()
}

/// For each connector id: the distinct signal kinds it is used as an
/// exporter from, and the distinct signal kinds it is used as a receiver
/// into. Together these determine the `E * R` connector node instances
/// described in the design's testable properties.
fn connector_signal_kinds(
    pipelines_config: &PipelinesConfig,
    connector_ids: &HashSet<ComponentId>,
) -> (HashMap<ComponentId, IndexSet<SignalKind>>, HashMap<ComponentId, IndexSet<SignalKind>>) {
    let mut from_kinds: HashMap<ComponentId, IndexSet<SignalKind>> = HashMap::new();
    let mut to_kinds: HashMap<ComponentId, IndexSet<SignalKind>> = HashMap::new();
    for (pipeline_id, cfg) in pipelines_config {
        let signal = pipeline_id.signal();
        for id in &cfg.exporters {
            if connector_ids.contains(id) {
                from_kinds.entry(id.clone()).or_default().insert(signal);
            }
        }
        for id in &cfg.receivers {
            if connector_ids.contains(id) {
                to_kinds.entry(id.clone()).or_default().insert(signal);
            }
        }
    }
    (from_kinds, to_kinds)
}

/// Longest-path topological level of every node: 0 for a node with no
/// predecessors, otherwise one more than the deepest predecessor. `order`
/// must be a valid forward topological order (producers before consumers).
fn compute_levels(edges: &EdgeSet, order: &[NodeKey]) -> HashMap<NodeKey, usize> {
    let mut levels: HashMap<NodeKey, usize> = edges.nodes().map(|n| (n, 0)).collect();
    for &node in order {
        let level = levels[&node];
        for &successor in edges.successors(node) {
            let entry = levels.entry(successor).or_insert(0);
            if level + 1 > *entry {
                *entry = level + 1;
            }
        }
    }
    levels
}

fn downstream_consumers(arena: &IndexMap<NodeKey, Arc<Node>>, edges: &EdgeSet, key: NodeKey) -> Vec<Arc<dyn Consumer>> {
    edges.successors(key).iter().map(|successor| arena[successor].as_consumer()).collect()
}

fn lookup_settings<'a>(
    component_configs: &'a SettingsRegistry,
    id: &ComponentId,
    role: &'static str,
    pipeline: &str,
) -> Result<&'a ComponentSettings, Error> {
    component_configs.get(id).ok_or_else(|| Error::NotConfigured {
        id: id.to_string(),
        role,
        pipeline: pipeline.to_string(),
    })
}

#[allow(clippy::too_many_arguments)]
fn instantiate(
    key: NodeKey,
    spec: &NodeSpec,
    arena: &IndexMap<NodeKey, Arc<Node>>,
    edges: &EdgeSet,
    component_configs: &SettingsRegistry,
    factories: &Factories,
    pipeline_processors: &IndexMap<PipelineId, Vec<NodeKey>>,
    true_receivers: &mut HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn crate::component::ReceiverComponent>>>,
    true_exporters: &mut HashMap<SignalKind, IndexMap<ComponentId, Arc<dyn crate::component::ExporterComponent>>>,
) -> Result<Arc<Node>, Error> {
    match spec {
        NodeSpec::Receiver { id, signal } => {
            let pipeline = format!("{signal}/*");
            let next = Splitter::assemble(downstream_consumers(arena, edges, key));
            let factory = factories.receivers.get(id.kind()).ok_or_else(|| Error::FactoryNotAvailable {
                id: id.to_string(),
                role: "receiver",
                pipeline: pipeline.clone(),
                type_: id.kind().to_string(),
            })?;
            let settings = lookup_settings(component_configs, id, "receiver", &pipeline)?;
            if !factory.supports(*signal) {
                return Err(Error::UnsupportedSignal {
                    id: id.to_string(),
                    role: "receiver",
                    pipeline,
                });
            }
            let component = factory
                .build(id, *signal, settings, next)
                .map_err(|source| build_error(id, "receiver", pipeline, source))?;
            true_receivers
                .entry(*signal)
                .or_default()
                .insert(id.clone(), Arc::clone(&component));
            Ok(Arc::new(Node::receiver(key, component)))
        }
        NodeSpec::Processor { id, pipeline, signal } => {
            let pipeline_display = pipeline.to_string();
            let next = Splitter::assemble(downstream_consumers(arena, edges, key));
            let factory = factories.processors.get(id.kind()).ok_or_else(|| Error::FactoryNotAvailable {
                id: id.to_string(),
                role: "processor",
                pipeline: pipeline_display.clone(),
                type_: id.kind().to_string(),
            })?;
            let settings = lookup_settings(component_configs, id, "processor", &pipeline_display)?;
            if !factory.supports(*signal) {
                return Err(Error::UnsupportedSignal {
                    id: id.to_string(),
                    role: "processor",
                    pipeline: pipeline_display,
                });
            }
            let component = factory
                .build(id, *signal, settings, next)
                .map_err(|source| build_error(id, "processor", pipeline_display, source))?;
            Ok(Arc::new(Node::processor(key, component)))
        }
        NodeSpec::Exporter { id, signal } => {
            let pipeline = format!("{signal}/*");
            let factory = factories.exporters.get(id.kind()).ok_or_else(|| Error::FactoryNotAvailable {
                id: id.to_string(),
                role: "exporter",
                pipeline: pipeline.clone(),
                type_: id.kind().to_string(),
            })?;
            let settings = lookup_settings(component_configs, id, "exporter", &pipeline)?;
            if !factory.supports(*signal) {
                return Err(Error::UnsupportedSignal {
                    id: id.to_string(),
                    role: "exporter",
                    pipeline,
                });
            }
            let component = factory
                .build(id, *signal, settings)
                .map_err(|source| build_error(id, "exporter", pipeline, source))?;
            true_exporters
                .entry(*signal)
                .or_default()
                .insert(id.clone(), Arc::clone(&component));
            Ok(Arc::new(Node::exporter(key, component)))
        }
        NodeSpec::Connector { id, from, to } => {
            let pipeline = format!("{from}->{to}");
            let next = Splitter::assemble(downstream_consumers(arena, edges, key));
            let factory = factories
                .connectors
                .get(id.kind())
                .ok_or_else(|| Error::ConnectorFactoryNotAvailable { type_: id.kind().to_string() })?;
            let settings = lookup_settings(component_configs, id, "connector", &pipeline)?;
            if !factory.supports(*from, *to) {
                return Err(Error::ConnectorUnsupportedSignal {
                    id: id.to_string(),
                    from: *from,
                    to: *to,
                });
            }
            let component = factory
                .build(id, *from, *to, settings, next)
                .map_err(|source| build_error(id, "connector", pipeline, source))?;
            Ok(Arc::new(Node::connector(key, component)))
        }
        NodeSpec::Capabilities { pipeline } => {
            let next = Splitter::assemble(downstream_consumers(arena, edges, key));
            let mutates = pipeline_processors
                .get(pipeline)
                .into_iter()
                .flatten()
                .any(|processor_key| arena[processor_key].mutates_data());
            Ok(Arc::new(Node::capabilities(key, Arc::new(CapabilitiesNode::new(mutates, next)))))
        }
        NodeSpec::FanOut { pipeline: _ } => {
            let consumers = downstream_consumers(arena, edges, key);
            Ok(Arc::new(Node::fan_out(key, Arc::new(Splitter::new(consumers)))))
        }
    }
}

fn build_error(id: &ComponentId, role: &'static str, pipeline: String, source: ConsumeError) -> Error {
    Error::Build {
        id: id.to_string(),
        role,
        pipeline,
        source,
    }
}
