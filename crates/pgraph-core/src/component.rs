// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The lifecycle surface every constructed component exposes, the four
//! factory traits that build them, and the registries the builder consults.

use crate::consumer::Consumer;
use crate::context::{Context, Host};
use crate::error::ConsumeError;
use pgraph_config::{ComponentId, SignalKind};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle methods common to every instantiated component. Start must be
/// idempotent against duplicate scheduling; the component is expected to be
/// fully constructed (its downstream consumer already wired) before `start`
/// is ever called.
pub trait Component: Send + Sync {
    /// Starts the component. Called at most once per node by the
    /// topological driver, but implementations should tolerate being called
    /// again without re-initializing (idempotency is enforced once more at
    /// the node-arena level; this is defense in depth).
    fn start(&self, ctx: &Context, host: &dyn Host) -> Result<(), ConsumeError>;

    /// Shuts the component down, releasing any resources it holds.
    fn shutdown(&self, ctx: &Context) -> Result<(), ConsumeError>;
}

/// A constructed receiver: a [`Component`] whose [`Consumer`] side is the
/// injection point external ingress (or a test driver) calls.
pub trait ReceiverComponent: Component + Consumer {}
impl<T: Component + Consumer> ReceiverComponent for T {}

/// A constructed processor: consumes from its upstream node, transforms,
/// and forwards to the consumer it was built with.
pub trait ProcessorComponent: Component + Consumer {}
impl<T: Component + Consumer> ProcessorComponent for T {}

/// A constructed exporter: the terminal [`Consumer`] of a pipeline.
pub trait ExporterComponent: Component + Consumer {}
impl<T: Component + Consumer> ExporterComponent for T {}

/// A constructed connector: simultaneously the terminal `Consumer` of its
/// source pipeline(s) and the entry point into its destination pipeline(s).
pub trait ConnectorComponent: Component + Consumer {}
impl<T: Component + Consumer> ConnectorComponent for T {}

/// Opaque, factory-specific settings for one component id. Parsing actual
/// configuration (YAML/TOML/...) into these is out of scope for this crate;
/// callers hand the builder whatever `Any` payload their own config loader
/// produced, keyed by [`ComponentId`].
pub type ComponentSettings = Arc<dyn Any + Send + Sync>;

/// A registry of component settings, keyed by id. Looking a id up here
/// failing is the `"<role>" "<id>" is not configured` build error.
pub type SettingsRegistry = HashMap<ComponentId, ComponentSettings>;

/// Builds a receiver component bound to a single downstream consumer.
pub trait ReceiverFactory: Send + Sync {
    /// Whether this factory can build a receiver for `signal`.
    fn supports(&self, signal: SignalKind) -> bool;

    /// Builds the receiver, already wired to forward into `next`.
    fn build(
        &self,
        id: &ComponentId,
        signal: SignalKind,
        settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn ReceiverComponent>, ConsumeError>;
}

/// Builds a processor component bound to a single downstream consumer.
pub trait ProcessorFactory: Send + Sync {
    /// Whether this factory can build a processor for `signal`.
    fn supports(&self, signal: SignalKind) -> bool;

    /// Builds the processor, already wired to forward into `next`.
    fn build(
        &self,
        id: &ComponentId,
        signal: SignalKind,
        settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn ProcessorComponent>, ConsumeError>;
}

/// Builds an exporter component: the terminal node of a pipeline branch.
pub trait ExporterFactory: Send + Sync {
    /// Whether this factory can build an exporter for `signal`.
    fn supports(&self, signal: SignalKind) -> bool;

    /// Builds the exporter.
    fn build(
        &self,
        id: &ComponentId,
        signal: SignalKind,
        settings: &ComponentSettings,
    ) -> Result<Arc<dyn ExporterComponent>, ConsumeError>;
}

/// Builds a connector component bound to a single downstream consumer
/// belonging to its destination pipeline(s).
pub trait ConnectorFactory: Send + Sync {
    /// Whether this factory can bridge from `from` to `to`.
    fn supports(&self, from: SignalKind, to: SignalKind) -> bool;

    /// Builds the connector, already wired to forward into `next`.
    fn build(
        &self,
        id: &ComponentId,
        from: SignalKind,
        to: SignalKind,
        settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn ConnectorComponent>, ConsumeError>;
}

/// The four factory registries the builder consults, keyed by component
/// type (the `type` half of a [`ComponentId`]).
#[derive(Default, Clone)]
pub struct Factories {
    /// Receiver factories keyed by component type.
    pub receivers: HashMap<String, Arc<dyn ReceiverFactory>>,
    /// Processor factories keyed by component type.
    pub processors: HashMap<String, Arc<dyn ProcessorFactory>>,
    /// Exporter factories keyed by component type.
    pub exporters: HashMap<String, Arc<dyn ExporterFactory>>,
    /// Connector factories keyed by component type.
    pub connectors: HashMap<String, Arc<dyn ConnectorFactory>>,
}

impl Factories {
    /// An empty set of factories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
