// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end builds of small graphs, exercising the seed scenarios.

use pgraph_config::{ComponentId, PipelineConfig, PipelineId, PipelinesConfig, SignalKind};
use pgraph_core::testing::{
    ExampleConnectorFactory, ExampleExporterFactory, ExampleExporterSettings, ExampleProcessorFactory,
    ExampleProcessorSettings, ExampleReceiverFactory, NoSettings,
};
use pgraph_core::{
    AnySignal, Component, ComponentSettings, ConnectorFactory, Consumer, Context, Error, ExporterFactory, Factories,
    Host, NopHost, ProcessorFactory, Record, ReceiverFactory, SettingsRegistry, TraceData,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

struct RecordingNode {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
    next: Option<Arc<dyn Consumer>>,
}

impl Consumer for RecordingNode {
    fn consume(&self, ctx: &Context, data: AnySignal) -> Result<(), pgraph_core::ConsumeError> {
        match &self.next {
            Some(next) => next.consume(ctx, data),
            None => Ok(()),
        }
    }
}

impl Component for RecordingNode {
    fn start(&self, _ctx: &Context, _host: &dyn Host) -> Result<(), pgraph_core::ConsumeError> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(format!("start:{}", self.name));
        Ok(())
    }

    fn shutdown(&self, _ctx: &Context) -> Result<(), pgraph_core::ConsumeError> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(format!("shutdown:{}", self.name));
        Ok(())
    }
}

struct RecordingFactory {
    log: Arc<Mutex<Vec<String>>>,
}

impl ReceiverFactory for RecordingFactory {
    fn supports(&self, _signal: SignalKind) -> bool {
        true
    }

    fn build(
        &self,
        id: &ComponentId,
        _signal: SignalKind,
        _settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn pgraph_core::ReceiverComponent>, pgraph_core::ConsumeError> {
        Ok(Arc::new(RecordingNode { name: id.to_string(), log: self.log.clone(), next: Some(next) }))
    }
}

impl ProcessorFactory for RecordingFactory {
    fn supports(&self, _signal: SignalKind) -> bool {
        true
    }

    fn build(
        &self,
        id: &ComponentId,
        _signal: SignalKind,
        _settings: &ComponentSettings,
        next: Arc<dyn Consumer>,
    ) -> Result<Arc<dyn pgraph_core::ProcessorComponent>, pgraph_core::ConsumeError> {
        Ok(Arc::new(RecordingNode { name: id.to_string(), log: self.log.clone(), next: Some(next) }))
    }
}

impl ExporterFactory for RecordingFactory {
    fn supports(&self, _signal: SignalKind) -> bool {
        true
    }

    fn build(
        &self,
        id: &ComponentId,
        _signal: SignalKind,
        _settings: &ComponentSettings,
    ) -> Result<Arc<dyn pgraph_core::ExporterComponent>, pgraph_core::ConsumeError> {
        Ok(Arc::new(RecordingNode { name: id.to_string(), log: self.log.clone(), next: None }))
    }
}

fn recording_factories(log: Arc<Mutex<Vec<String>>>) -> Factories {
    let factory = Arc::new(RecordingFactory { log });
    let mut factories = Factories::new();
    factories.receivers.insert("recording".to_string(), factory.clone());
    factories.processors.insert("recording".to_string(), factory.clone());
    factories.exporters.insert("recording".to_string(), factory);
    factories
}

fn no_settings_for(ids: &[ComponentId]) -> SettingsRegistry {
    let mut settings: SettingsRegistry = HashMap::new();
    for id in ids {
        settings.insert(id.clone(), Arc::new(NoSettings) as ComponentSettings);
    }
    settings
}

fn example_factories_with_exporter() -> (Factories, Arc<ExampleExporterFactory>) {
    let exporter_factory = Arc::new(ExampleExporterFactory::default());
    let mut factories = Factories::new();
    factories.receivers.insert("examplereceiver".to_string(), Arc::new(ExampleReceiverFactory));
    factories.processors.insert("exampleprocessor".to_string(), Arc::new(ExampleProcessorFactory));
    factories.connectors.insert("exampleconnector".to_string(), Arc::new(ExampleConnectorFactory));
    factories.exporters.insert("exampleexporter".to_string(), exporter_factory.clone());
    (factories, exporter_factory)
}

// Scenario 1: linear start/stop ordering, with a shared-receiver capabilities
// fan-in and a fan-out to two exporters.
#[test]
fn linear_start_and_stop_respects_topological_order() {
    let r1 = ComponentId::new("recording", "r1");
    let r2 = ComponentId::new("recording", "r2");
    let p1 = ComponentId::new("recording", "p1");
    let p2 = ComponentId::new("recording", "p2");
    let e1 = ComponentId::new("recording", "e1");
    let e2 = ComponentId::new("recording", "e2");

    let mut pipelines_config: PipelinesConfig = PipelinesConfig::new();
    pipelines_config.insert(
        PipelineId::from_signal(SignalKind::Traces),
        PipelineConfig {
            receivers: vec![r1.clone(), r2.clone()],
            processors: vec![p1.clone(), p2.clone()],
            exporters: vec![e1.clone(), e2.clone()],
        },
    );

    let log = Arc::new(Mutex::new(Vec::new()));
    let factories = recording_factories(log.clone());
    let settings = no_settings_for(&[r1.clone(), r2.clone(), p1.clone(), p2.clone(), e1.clone(), e2.clone()]);

    let pipelines = pgraph_core::build(&pipelines_config, &settings, &factories).unwrap();
    let ctx = Context::new();
    pipelines.start_all(&ctx, &NopHost).unwrap();
    pipelines.shutdown_all(&ctx).unwrap();

    let events = log.lock().unwrap().clone();
    let pos = |event: &str| events.iter().position(|e| e == event).unwrap();

    assert!(pos("start:recording/e1") < pos("start:recording/p2"));
    assert!(pos("start:recording/e2") < pos("start:recording/p2"));
    assert!(pos("start:recording/p2") < pos("start:recording/p1"));
    assert!(pos("start:recording/p1") < pos("start:recording/r1"));
    assert!(pos("start:recording/p1") < pos("start:recording/r2"));

    assert!(pos("shutdown:recording/r1") < pos("shutdown:recording/p1"));
    assert!(pos("shutdown:recording/r2") < pos("shutdown:recording/p1"));
    assert!(pos("shutdown:recording/p1") < pos("shutdown:recording/p2"));
    assert!(pos("shutdown:recording/p2") < pos("shutdown:recording/e1"));
    assert!(pos("shutdown:recording/p2") < pos("shutdown:recording/e2"));
}

// Scenario 2: a receiver and an exporter shared by two pipelines collapse to
// one underlying node each.
#[test]
fn shared_receiver_and_exporter_collapse_to_one_node() {
    let r1 = ComponentId::new("recording", "shared_in");
    let e1 = ComponentId::new("recording", "shared_out");
    let pa = ComponentId::new("recording", "pa");
    let pb = ComponentId::new("recording", "pb");

    let mut pipelines_config: PipelinesConfig = PipelinesConfig::new();
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "a"),
        PipelineConfig {
            receivers: vec![r1.clone()],
            processors: vec![pa.clone()],
            exporters: vec![e1.clone()],
        },
    );
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "b"),
        PipelineConfig {
            receivers: vec![r1.clone()],
            processors: vec![pb.clone()],
            exporters: vec![e1.clone()],
        },
    );

    let log = Arc::new(Mutex::new(Vec::new()));
    let factories = recording_factories(log);
    let settings = no_settings_for(&[r1.clone(), e1.clone(), pa.clone(), pb.clone()]);

    let pipelines = pgraph_core::build(&pipelines_config, &settings, &factories).unwrap();

    assert_eq!(pipelines.receivers()[&SignalKind::Traces].len(), 1);
    assert_eq!(pipelines.exporters()[&SignalKind::Traces].len(), 1);

    let views = pipelines.pipelines();
    let view_a = &views[&PipelineId::new(SignalKind::Traces, "a")];
    let view_b = &views[&PipelineId::new(SignalKind::Traces, "b")];
    assert_eq!(view_a.receivers()[0], view_b.receivers()[0]);
    assert_eq!(view_a.exporters()[0], view_b.exporters()[0]);
}

// Scenario 3 (and the §3.2 connector internal fan-out behavior): a fork/merge
// connector topology. Injecting one trace at the inbound receiver causes the
// outbound exporter to observe exactly two traces, one per fork branch.
#[test]
fn connector_fork_merge_duplicates_across_branches() {
    let (factories, exporter_factory) = example_factories_with_exporter();

    let in_recv = ComponentId::new("examplereceiver", "in");
    let fork = ComponentId::new("exampleconnector", "fork");
    let merge = ComponentId::new("exampleconnector", "merge");
    let out_exp = ComponentId::new("exampleexporter", "out");

    let mut pipelines_config: PipelinesConfig = PipelinesConfig::new();
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "in"),
        PipelineConfig {
            receivers: vec![in_recv.clone()],
            processors: vec![],
            exporters: vec![fork.clone()],
        },
    );
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "type0"),
        PipelineConfig {
            receivers: vec![fork.clone()],
            processors: vec![],
            exporters: vec![merge.clone()],
        },
    );
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "type1"),
        PipelineConfig {
            receivers: vec![fork.clone()],
            processors: vec![],
            exporters: vec![merge.clone()],
        },
    );
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "out"),
        PipelineConfig {
            receivers: vec![merge.clone()],
            processors: vec![],
            exporters: vec![out_exp.clone()],
        },
    );

    let settings = no_settings_for(&[in_recv.clone(), fork.clone(), merge.clone(), out_exp.clone()]);
    let pipelines = pgraph_core::build(&pipelines_config, &settings, &factories).unwrap();

    let receiver = pipelines.receivers()[&SignalKind::Traces][&in_recv].clone();
    let ctx = Context::new();
    let payload = AnySignal::Traces(TraceData::new(vec![Record::named("span")]));
    receiver.consume(&ctx, payload).unwrap();

    let exporter = exporter_factory.instance(&out_exp).unwrap();
    assert_eq!(exporter.count(), 2);
}

// Scenario 4: a pipeline whose receiver list and exporter list both name the
// same connector id forms a cycle and is rejected at build time.
#[test]
fn connector_loop_back_is_rejected_as_cyclic() {
    let loop_id = ComponentId::new("exampleconnector", "loop");
    let (factories, _exporter_factory) = example_factories_with_exporter();

    let mut pipelines_config: PipelinesConfig = PipelinesConfig::new();
    pipelines_config.insert(
        PipelineId::from_signal(SignalKind::Traces),
        PipelineConfig {
            receivers: vec![loop_id.clone()],
            processors: vec![],
            exporters: vec![loop_id.clone()],
        },
    );
    let settings = no_settings_for(&[loop_id]);

    let err = pgraph_core::build(&pipelines_config, &settings, &factories).unwrap_err();
    assert!(matches!(err, Error::Cyclic { .. }));
    assert!(err.to_string().starts_with("topo: no topological ordering: cyclic components"));
}

// Scenario 5: an exporter id with no registered factory fails with the fixed
// compatibility-relevant message.
#[test]
fn unknown_exporter_factory_produces_fixed_message() {
    let recv = ComponentId::new("recording", "r");
    let unknown = ComponentId::from_type("unknown");

    let mut pipelines_config: PipelinesConfig = PipelinesConfig::new();
    pipelines_config.insert(
        PipelineId::from_signal(SignalKind::Traces),
        PipelineConfig {
            receivers: vec![recv.clone()],
            processors: vec![],
            exporters: vec![unknown.clone()],
        },
    );

    let log = Arc::new(Mutex::new(Vec::new()));
    let factories = recording_factories(log);
    let settings = no_settings_for(&[recv, unknown]);

    let err = pgraph_core::build(&pipelines_config, &settings, &factories).unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to create \"unknown\" exporter, in pipeline \"traces/*\": exporter factory not available for: \"unknown\""
    );
}

// Scenario 6: a pipeline with two exporters, one declaring `mutates_data`;
// the fan-out hands that one an independent copy and the other a shared
// reference, both with identical contents. The pipeline also carries a
// mutating processor, so its capabilities node's aggregate flag is
// exercised at the same time.
#[test]
fn mutating_processor_causes_independent_copy_for_one_branch() {
    let (factories, exporter_factory) = example_factories_with_exporter();

    let recv = ComponentId::new("examplereceiver", "r");
    let mutator = ComponentId::new("exampleprocessor", "mut");
    let a = ComponentId::new("exampleexporter", "a");
    let b = ComponentId::new("exampleexporter", "b");

    let mut pipelines_config: PipelinesConfig = PipelinesConfig::new();
    pipelines_config.insert(
        PipelineId::from_signal(SignalKind::Traces),
        PipelineConfig {
            receivers: vec![recv.clone()],
            processors: vec![mutator.clone()],
            exporters: vec![a.clone(), b.clone()],
        },
    );

    let mut settings = no_settings_for(&[recv.clone(), a.clone(), b.clone()]);
    settings.insert(mutator.clone(), Arc::new(ExampleProcessorSettings { mutates: true }) as ComponentSettings);
    settings.insert(b.clone(), Arc::new(ExampleExporterSettings { mutates: true }) as ComponentSettings);

    let pipelines = pgraph_core::build(&pipelines_config, &settings, &factories).unwrap();

    let view = &pipelines.pipelines()[&PipelineId::from_signal(SignalKind::Traces)];
    assert!(view.mutates_data());

    let receiver = pipelines.receivers()[&SignalKind::Traces][&recv].clone();
    let ctx = Context::new();
    let payload = AnySignal::Traces(TraceData::new(vec![Record::named("span")]));
    receiver.consume(&ctx, payload).unwrap();

    let exporter_a = exporter_factory.instance(&a).unwrap();
    let exporter_b = exporter_factory.instance(&b).unwrap();
    let received_a = exporter_a.received();
    let received_b = exporter_b.received();
    assert_eq!(received_a.len(), 1);
    assert_eq!(received_b.len(), 1);
    assert!(!received_a[0].is_shared_with(&received_b[0]));
}

// §3.1: a receiver shared by a mutating pipeline and a non-mutating pipeline
// makes its copy-policy decision per destination, not once globally.
#[test]
fn shared_receiver_applies_capability_per_destination() {
    let (factories, exporter_factory) = example_factories_with_exporter();

    let recv = ComponentId::new("examplereceiver", "shared");
    let mutator = ComponentId::new("exampleprocessor", "mut");
    let mutating_exporter = ComponentId::new("exampleexporter", "mutating_side");
    let plain_exporter = ComponentId::new("exampleexporter", "plain_side");

    let mut pipelines_config: PipelinesConfig = PipelinesConfig::new();
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "mutating"),
        PipelineConfig {
            receivers: vec![recv.clone()],
            processors: vec![mutator.clone()],
            exporters: vec![mutating_exporter.clone()],
        },
    );
    pipelines_config.insert(
        PipelineId::new(SignalKind::Traces, "plain"),
        PipelineConfig {
            receivers: vec![recv.clone()],
            processors: vec![],
            exporters: vec![plain_exporter.clone()],
        },
    );

    let mut settings = no_settings_for(&[recv.clone(), mutating_exporter.clone(), plain_exporter.clone()]);
    settings.insert(mutator, Arc::new(ExampleProcessorSettings { mutates: true }) as ComponentSettings);

    let pipelines = pgraph_core::build(&pipelines_config, &settings, &factories).unwrap();

    let receiver = pipelines.receivers()[&SignalKind::Traces][&recv].clone();
    let ctx = Context::new();
    let original = AnySignal::Traces(TraceData::new(vec![Record::named("span")]));
    let original_clone = original.share();
    receiver.consume(&ctx, original).unwrap();

    let mutating_side = exporter_factory.instance(&mutating_exporter).unwrap();
    let plain_side = exporter_factory.instance(&plain_exporter).unwrap();

    let received_mutating = mutating_side.received();
    let received_plain = plain_side.received();
    assert!(!received_mutating[0].is_shared_with(&original_clone), "mutating branch should get its own copy");
    assert!(received_plain[0].is_shared_with(&original_clone), "non-mutating branch should share the original");
}
