// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Stable node identity: a 64-bit key derived from a role-specific
//! discriminant tuple, plus the [`NodeRole`] enum.

use pgraph_config::{ComponentId, PipelineId, SignalKind};
use std::fmt;
use std::hash::{Hash, Hasher};

// Fixed (not process-randomized) seeds so that two `NodeKey` computations
// for the same discriminant tuple always collide, including across separate
// calls within the same `build`. ahash's default `RandomState` reseeds per
// process and would break the sharing invariant in §3 if used here.
const SEED_0: u64 = 0x5771_1a4f_d1c4_f633;
const SEED_1: u64 = 0x2b92_9a15_7b3f_9c1d;
const SEED_2: u64 = 0x9e37_79b9_7f4a_7c15;
const SEED_3: u64 = 0xbf58_476d_1ce4_e5b9;

static HASH_STATE: once_cell::sync::Lazy<ahash::RandomState> =
    once_cell::sync::Lazy::new(|| ahash::RandomState::with_seeds(SEED_0, SEED_1, SEED_2, SEED_3));

/// The role a node plays in the graph. The first four come directly from
/// configuration; `Capabilities` and `FanOut` are synthesized once per
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// A receiver node, one per (shared receiver, signal kind it feeds).
    Receiver,
    /// A processor node, private to one pipeline.
    Processor,
    /// An exporter node, one per (shared exporter, signal kind it drains).
    Exporter,
    /// A connector node, one per (component id, from signal, to signal).
    Connector,
    /// The synthesized per-pipeline capabilities node.
    Capabilities,
    /// The synthesized per-pipeline fan-out node.
    FanOut,
}

impl NodeRole {
    /// The lower-case name used in error messages and tracing fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Receiver => "receiver",
            NodeRole::Processor => "processor",
            NodeRole::Exporter => "exporter",
            NodeRole::Connector => "connector",
            NodeRole::Capabilities => "capabilities",
            NodeRole::FanOut => "fan_out",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stable 64-bit key identifying one node in the graph. Two config
/// references that produce an equal key resolve to the same runtime node;
/// this is the mechanism by which shared receivers/exporters/connectors
/// collapse to a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u64);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Hash)]
enum Discriminant<'a> {
    Receiver(&'a ComponentId, SignalKind),
    Processor(&'a ComponentId, &'a PipelineId),
    Exporter(&'a ComponentId, SignalKind),
    Connector(&'a ComponentId, SignalKind, SignalKind),
    Capabilities(&'a PipelineId),
    FanOut(&'a PipelineId),
}

fn hash_discriminant(value: &Discriminant<'_>) -> u64 {
    use std::hash::BuildHasher;
    let mut hasher = HASH_STATE.build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

impl NodeKey {
    /// Key for a receiver node: one per (component id, signal kind it feeds).
    #[must_use]
    pub fn receiver(id: &ComponentId, signal: SignalKind) -> Self {
        Self(hash_discriminant(&Discriminant::Receiver(id, signal)))
    }

    /// Key for a processor node: private per pipeline.
    #[must_use]
    pub fn processor(id: &ComponentId, pipeline: &PipelineId) -> Self {
        Self(hash_discriminant(&Discriminant::Processor(id, pipeline)))
    }

    /// Key for an exporter node: one per (component id, signal kind it drains).
    #[must_use]
    pub fn exporter(id: &ComponentId, signal: SignalKind) -> Self {
        Self(hash_discriminant(&Discriminant::Exporter(id, signal)))
    }

    /// Key for a connector node: one per (component id, from signal, to signal).
    #[must_use]
    pub fn connector(id: &ComponentId, from: SignalKind, to: SignalKind) -> Self {
        Self(hash_discriminant(&Discriminant::Connector(id, from, to)))
    }

    /// Key for the synthesized capabilities node of a pipeline.
    #[must_use]
    pub fn capabilities(pipeline: &PipelineId) -> Self {
        Self(hash_discriminant(&Discriminant::Capabilities(pipeline)))
    }

    /// Key for the synthesized fan-out node of a pipeline.
    #[must_use]
    pub fn fan_out(pipeline: &PipelineId) -> Self {
        Self(hash_discriminant(&Discriminant::FanOut(pipeline)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgraph_config::SignalKind;

    #[test]
    fn same_discriminant_collides() {
        let a = ComponentId::new("otlp", "primary");
        let b = ComponentId::new("otlp", "primary");
        assert_eq!(
            NodeKey::receiver(&a, SignalKind::Traces),
            NodeKey::receiver(&b, SignalKind::Traces)
        );
    }

    #[test]
    fn different_signal_kind_differs() {
        let id = ComponentId::new("otlp", "primary");
        assert_ne!(
            NodeKey::receiver(&id, SignalKind::Traces),
            NodeKey::receiver(&id, SignalKind::Metrics)
        );
    }

    #[test]
    fn different_roles_differ_even_with_same_tuple_shape() {
        let id = ComponentId::new("otlp", "primary");
        let pipeline = PipelineId::new(SignalKind::Traces, "in");
        // A processor's key is scoped by pipeline, a receiver's by signal;
        // make sure the role itself participates in the hash, not just the
        // trailing field.
        let receiver_key = NodeKey::receiver(&id, SignalKind::Traces);
        let exporter_key = NodeKey::exporter(&id, SignalKind::Traces);
        assert_ne!(receiver_key, exporter_key);
        let _ = pipeline;
    }
}
