// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! [`Node`]: the graph's runtime unit. Wraps one instantiated component (or
//! a synthesized capabilities/fan-out node) with the bookkeeping needed to
//! make `start`/`shutdown` idempotent no matter how many edges point at it.

use crate::component::{ConnectorComponent, ExporterComponent, ProcessorComponent, ReceiverComponent};
use crate::consumer::{Consumer, Splitter};
use crate::context::{Context, Host};
use crate::error::{ConsumeError, Error};
use crate::node_key::{NodeKey, NodeRole};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The synthesized per-pipeline capabilities node: a transparent consumer
/// that carries the OR of its pipeline's processors' `mutates_data` flags,
/// for upstream receivers/connector-sources to make their own copy-policy
/// decision against (see §3.1 of the design).
pub struct CapabilitiesNode {
    mutates: bool,
    next: Arc<dyn Consumer>,
}

impl CapabilitiesNode {
    /// Builds a capabilities node forwarding into `next`, reporting `mutates`
    /// as its aggregate mutation flag.
    #[must_use]
    pub fn new(mutates: bool, next: Arc<dyn Consumer>) -> Self {
        Self { mutates, next }
    }
}

impl Consumer for CapabilitiesNode {
    fn mutates_data(&self) -> bool {
        self.mutates
    }

    fn consume(&self, ctx: &Context, data: crate::pdata::AnySignal) -> Result<(), ConsumeError> {
        self.next.consume(ctx, data)
    }
}

enum NodeKind {
    Receiver(Arc<dyn ReceiverComponent>),
    Processor(Arc<dyn ProcessorComponent>),
    Exporter(Arc<dyn ExporterComponent>),
    Connector(Arc<dyn ConnectorComponent>),
    Capabilities(Arc<CapabilitiesNode>),
    FanOut(Arc<Splitter>),
}

/// One node in the instantiated graph: an identity ([`NodeKey`]), a role,
/// and the wrapped component (or synthesized node). `start`/`shutdown` are
/// idempotent: a node reached by more than one edge is only ever started or
/// shut down once, regardless of how many times the driver visits it.
pub struct Node {
    key: NodeKey,
    role: NodeRole,
    kind: NodeKind,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl Node {
    fn new(key: NodeKey, role: NodeRole, kind: NodeKind) -> Self {
        Self {
            key,
            role,
            kind,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Wraps an instantiated receiver.
    #[must_use]
    pub fn receiver(key: NodeKey, component: Arc<dyn ReceiverComponent>) -> Self {
        Self::new(key, NodeRole::Receiver, NodeKind::Receiver(component))
    }

    /// Wraps an instantiated processor.
    #[must_use]
    pub fn processor(key: NodeKey, component: Arc<dyn ProcessorComponent>) -> Self {
        Self::new(key, NodeRole::Processor, NodeKind::Processor(component))
    }

    /// Wraps an instantiated exporter.
    #[must_use]
    pub fn exporter(key: NodeKey, component: Arc<dyn ExporterComponent>) -> Self {
        Self::new(key, NodeRole::Exporter, NodeKind::Exporter(component))
    }

    /// Wraps an instantiated connector.
    #[must_use]
    pub fn connector(key: NodeKey, component: Arc<dyn ConnectorComponent>) -> Self {
        Self::new(key, NodeRole::Connector, NodeKind::Connector(component))
    }

    /// Wraps a synthesized capabilities node.
    #[must_use]
    pub fn capabilities(key: NodeKey, node: Arc<CapabilitiesNode>) -> Self {
        Self::new(key, NodeRole::Capabilities, NodeKind::Capabilities(node))
    }

    /// Wraps a synthesized fan-out node.
    #[must_use]
    pub fn fan_out(key: NodeKey, splitter: Arc<Splitter>) -> Self {
        Self::new(key, NodeRole::FanOut, NodeKind::FanOut(splitter))
    }

    /// This node's stable identity.
    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// This node's role.
    #[must_use]
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// This node's consumer side, the entry point its upstream edges call.
    #[must_use]
    pub fn as_consumer(&self) -> Arc<dyn Consumer> {
        match &self.kind {
            NodeKind::Receiver(c) => Arc::clone(c) as Arc<dyn Consumer>,
            NodeKind::Processor(c) => Arc::clone(c) as Arc<dyn Consumer>,
            NodeKind::Exporter(c) => Arc::clone(c) as Arc<dyn Consumer>,
            NodeKind::Connector(c) => Arc::clone(c) as Arc<dyn Consumer>,
            NodeKind::Capabilities(c) => Arc::clone(c) as Arc<dyn Consumer>,
            NodeKind::FanOut(c) => Arc::clone(c) as Arc<dyn Consumer>,
        }
    }

    /// Whether this node's consumer side mutates the payload it is handed.
    #[must_use]
    pub fn mutates_data(&self) -> bool {
        self.as_consumer().mutates_data()
    }

    /// Starts this node's wrapped component, if it has lifecycle at all.
    /// Synthesized capabilities/fan-out nodes have none and always succeed.
    /// Idempotent: a second call is a silent no-op.
    pub fn start(&self, ctx: &Context, host: &dyn Host) -> Result<(), Error> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(node_key = %self.key, role = %self.role, "starting node");
        let result = match &self.kind {
            NodeKind::Receiver(c) => c.start(ctx, host),
            NodeKind::Processor(c) => c.start(ctx, host),
            NodeKind::Exporter(c) => c.start(ctx, host),
            NodeKind::Connector(c) => c.start(ctx, host),
            NodeKind::Capabilities(_) | NodeKind::FanOut(_) => Ok(()),
        };
        result.map_err(|source| {
            let err = Error::start_failed(self.key, self.role.as_str(), source);
            tracing::error!(node_key = %self.key, role = %self.role, error = %err, "node failed to start");
            err
        })
    }

    /// Shuts this node's wrapped component down. Idempotent: a second call
    /// is a silent no-op.
    pub fn shutdown(&self, ctx: &Context) -> Result<(), Error> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(node_key = %self.key, role = %self.role, "shutting down node");
        let result = match &self.kind {
            NodeKind::Receiver(c) => c.shutdown(ctx),
            NodeKind::Processor(c) => c.shutdown(ctx),
            NodeKind::Exporter(c) => c.shutdown(ctx),
            NodeKind::Connector(c) => c.shutdown(ctx),
            NodeKind::Capabilities(_) | NodeKind::FanOut(_) => Ok(()),
        };
        result.map_err(|source| {
            let err = Error::shutdown_failed(self.key, self.role.as_str(), source);
            tracing::error!(node_key = %self.key, role = %self.role, error = %err, "node failed to shut down");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NopHost;
    use crate::pdata::AnySignal;
    use std::sync::atomic::AtomicUsize;

    struct CountingComponent {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl Consumer for CountingComponent {
        fn consume(&self, _ctx: &Context, _data: AnySignal) -> Result<(), ConsumeError> {
            Ok(())
        }
    }

    impl crate::component::Component for CountingComponent {
        fn start(&self, _ctx: &Context, _host: &dyn Host) -> Result<(), ConsumeError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn shutdown(&self, _ctx: &Context) -> Result<(), ConsumeError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn start_and_shutdown_are_idempotent() {
        let component = Arc::new(CountingComponent {
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        });
        let node = Node::exporter(NodeKey::exporter(&pgraph_config::ComponentId::new("otlp", ""), pgraph_config::SignalKind::Traces), component.clone());
        let ctx = Context::new();
        node.start(&ctx, &NopHost).unwrap();
        node.start(&ctx, &NopHost).unwrap();
        node.shutdown(&ctx).unwrap();
        node.shutdown(&ctx).unwrap();
        assert_eq!(component.starts.load(Ordering::SeqCst), 1);
        assert_eq!(component.stops.load(Ordering::SeqCst), 1);
    }
}
