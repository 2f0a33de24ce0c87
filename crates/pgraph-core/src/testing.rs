// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Minimal example components and factories used by the integration tests.
//! Not a general-purpose testing framework: just enough to drive data
//! through a built graph and observe what arrived where.

use crate::component::{
    ComponentSettings, Component, ConnectorComponent, ConnectorFactory, ExporterComponent, ExporterFactory,
    Factories, ProcessorComponent, ProcessorFactory, ReceiverComponent, ReceiverFactory,
};
use crate::consumer::Consumer;
use crate::context::{Context, Host};
use crate::error::ConsumeError;
use crate::pdata::AnySignal;
use pgraph_config::SignalKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// An example receiver: a pass-through that forwards whatever is handed to
/// its `consume` method (the test-driver's injection point) straight into
/// its downstream consumer. Supports every signal kind.
pub struct ExampleReceiver {
    next: Arc<dyn Consumer>,
    started: AtomicBool,
}

impl ExampleReceiver {
    /// Hands `data` to this receiver, as an external ingress call would.
    pub fn receive(&self, ctx: &Context, data: AnySignal) -> Result<(), ConsumeError> {
        self.next.consume(ctx, data)
    }

    /// Whether `start` has been called at least once.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl Consumer for ExampleReceiver {
    fn consume(&self, ctx: &Context, data: AnySignal) -> Result<(), ConsumeError> {
        self.next.consume(ctx, data)
    }
}

impl Component for ExampleReceiver {
    fn start(&self, _ctx: &Context, _host: &dyn Host) -> Result<(), ConsumeError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self, _ctx: &Context) -> Result<(), ConsumeError> {
        Ok(())
    }
}

/// Factory for [`ExampleReceiver`]. Type name: `examplereceiver`.
#[derive(Default)]
pub struct ExampleReceiverFactory;

impl ReceiverFactory for ExampleReceiverFactory {
    fn supports(&self, _signal: SignalKind) -> bool {
        true
    }

    fn build(
        &self,
        _id: &pgraph_config::ComponentId,
        _signal: SignalKind,
        _settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn ReceiverComponent>, ConsumeError> {
        Ok(Arc::new(ExampleReceiver {
            next,
            started: AtomicBool::new(false),
        }))
    }
}

/// An example processor. Optionally mutates in place (appends a marker
/// record to whatever batch it sees) to exercise the fan-out copy policy.
pub struct ExampleProcessor {
    next: Arc<dyn Consumer>,
    mutates: bool,
}

impl Consumer for ExampleProcessor {
    fn mutates_data(&self) -> bool {
        self.mutates
    }

    fn consume(&self, ctx: &Context, data: AnySignal) -> Result<(), ConsumeError> {
        self.next.consume(ctx, data)
    }
}

impl Component for ExampleProcessor {
    fn start(&self, _ctx: &Context, _host: &dyn Host) -> Result<(), ConsumeError> {
        Ok(())
    }

    fn shutdown(&self, _ctx: &Context) -> Result<(), ConsumeError> {
        Ok(())
    }
}

/// Factory-level settings for [`ExampleProcessor`]: whether it should
/// report `mutates_data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleProcessorSettings {
    /// Whether the built processor reports `mutates_data() == true`.
    pub mutates: bool,
}

/// Factory for [`ExampleProcessor`]. Type name: `exampleprocessor`.
#[derive(Default)]
pub struct ExampleProcessorFactory;

impl ProcessorFactory for ExampleProcessorFactory {
    fn supports(&self, _signal: SignalKind) -> bool {
        true
    }

    fn build(
        &self,
        _id: &pgraph_config::ComponentId,
        _signal: SignalKind,
        settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn ProcessorComponent>, ConsumeError> {
        let mutates = settings
            .downcast_ref::<ExampleProcessorSettings>()
            .map(|s| s.mutates)
            .unwrap_or(false);
        Ok(Arc::new(ExampleProcessor { next, mutates }))
    }
}

/// An example exporter: records every payload it receives, by allocation
/// identity and contents, so tests can assert on what arrived and whether
/// two branches shared or copied.
#[derive(Default)]
pub struct ExampleExporter {
    received: Mutex<Vec<AnySignal>>,
    mutates: bool,
}

impl ExampleExporter {
    /// Every payload this exporter has received so far, in arrival order.
    #[must_use]
    pub fn received(&self) -> Vec<AnySignal> {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of payloads received so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Consumer for ExampleExporter {
    fn mutates_data(&self) -> bool {
        self.mutates
    }

    fn consume(&self, _ctx: &Context, data: AnySignal) -> Result<(), ConsumeError> {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).push(data);
        Ok(())
    }
}

impl Component for ExampleExporter {
    fn start(&self, _ctx: &Context, _host: &dyn Host) -> Result<(), ConsumeError> {
        Ok(())
    }

    fn shutdown(&self, _ctx: &Context) -> Result<(), ConsumeError> {
        Ok(())
    }
}

/// Factory for [`ExampleExporter`]. Type name: `exampleexporter`. Every
/// instance built shares one underlying exporter keyed by component id, so
/// tests can retrieve the exporter they built by id after `build()`.
#[derive(Default)]
pub struct ExampleExporterFactory {
    instances: Mutex<std::collections::HashMap<pgraph_config::ComponentId, Arc<ExampleExporter>>>,
}

impl ExampleExporterFactory {
    /// The exporter instance built for `id`, if `build` has been called
    /// for it yet.
    #[must_use]
    pub fn instance(&self, id: &pgraph_config::ComponentId) -> Option<Arc<ExampleExporter>> {
        self.instances.lock().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }
}

impl ExporterFactory for ExampleExporterFactory {
    fn supports(&self, _signal: SignalKind) -> bool {
        true
    }

    fn build(
        &self,
        id: &pgraph_config::ComponentId,
        _signal: SignalKind,
        settings: &ComponentSettings,
    ) -> Result<Arc<dyn ExporterComponent>, ConsumeError> {
        let mutates = settings
            .downcast_ref::<ExampleExporterSettings>()
            .map(|s| s.mutates)
            .unwrap_or(false);
        let exporter = Arc::new(ExampleExporter { received: Mutex::new(Vec::new()), mutates });
        self.instances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), Arc::clone(&exporter));
        Ok(exporter)
    }
}

/// Factory-level settings for [`ExampleExporter`]: whether it should report
/// `mutates_data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleExporterSettings {
    /// Whether the built exporter reports `mutates_data() == true`.
    pub mutates: bool,
}

/// An example connector: forwards whatever it receives from its source
/// pipeline(s) into its destination pipeline(s), optionally translating
/// signal kind (by dropping the payload's original kind tag and re-tagging
/// it, which only the `fork`/`merge` test connectors that keep `from == to`
/// actually need — a true cross-signal connector would translate content,
/// which is out of scope for this stand-in).
pub struct ExampleConnector {
    next: Arc<dyn Consumer>,
}

impl Consumer for ExampleConnector {
    fn consume(&self, ctx: &Context, data: AnySignal) -> Result<(), ConsumeError> {
        self.next.consume(ctx, data)
    }
}

impl Component for ExampleConnector {
    fn start(&self, _ctx: &Context, _host: &dyn Host) -> Result<(), ConsumeError> {
        Ok(())
    }

    fn shutdown(&self, _ctx: &Context) -> Result<(), ConsumeError> {
        Ok(())
    }
}

/// Factory for [`ExampleConnector`]. Type name: `exampleconnector`.
/// Supports only same-signal bridging (`from == to`), sufficient for the
/// fork/merge seed scenario.
#[derive(Default)]
pub struct ExampleConnectorFactory;

impl ConnectorFactory for ExampleConnectorFactory {
    fn supports(&self, from: SignalKind, to: SignalKind) -> bool {
        from == to
    }

    fn build(
        &self,
        _id: &pgraph_config::ComponentId,
        _from: SignalKind,
        _to: SignalKind,
        _settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn ConnectorComponent>, ConsumeError> {
        Ok(Arc::new(ExampleConnector { next }))
    }
}

/// A minimal no-op settings payload for components (like [`ExampleReceiver`],
/// [`ExampleExporter`], and [`ExampleConnector`]) that take no configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSettings;

/// Builds a [`Factories`] registry with `examplereceiver`, `exampleprocessor`,
/// `exampleexporter`, and `exampleconnector` registered under those type
/// names, for tests that don't need custom factories.
#[must_use]
pub fn example_factories() -> Factories {
    let mut factories = Factories::new();
    factories
        .receivers
        .insert("examplereceiver".to_string(), Arc::new(ExampleReceiverFactory));
    factories
        .processors
        .insert("exampleprocessor".to_string(), Arc::new(ExampleProcessorFactory));
    factories
        .exporters
        .insert("exampleexporter".to_string(), Arc::new(ExampleExporterFactory::default()));
    factories
        .connectors
        .insert("exampleconnector".to_string(), Arc::new(ExampleConnectorFactory));
    factories
}
