// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The telemetry pipeline graph engine: compiles a declarative set of
//! pipelines into one DAG of runtime components and drives its lifecycle.
//!
//! [`graph::build`] turns a [`pgraph_config::PipelinesConfig`] plus factory
//! and settings registries into a [`pipelines::Pipelines`] handle; the
//! handle then exposes `start_all`/`shutdown_all` and the enumeration
//! surface described in the crate's design (receivers/exporters grouped by
//! signal kind, and per-pipeline views).
//!
//! Everything here runs on the caller's thread of execution: there is no
//! background scheduler, channel, or async runtime. An incoming call into a
//! receiver synchronously traverses capabilities → processors → fan-out →
//! exporters and returns only once every downstream branch has returned.

mod component;
mod consumer;
mod context;
mod error;
mod graph;
mod node;
mod node_key;
mod pdata;
mod pipelines;
mod topo;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use component::{
    ComponentSettings, Component, ConnectorComponent, ConnectorFactory, ExporterComponent, ExporterFactory,
    Factories, ProcessorComponent, ProcessorFactory, ReceiverComponent, ReceiverFactory, SettingsRegistry,
};
pub use consumer::{Consumer, Splitter};
pub use context::{CancellationHandle, Context, Host, NopHost};
pub use error::{format_error_sources, ConsumeError, Error};
pub use graph::build;
pub use node_key::{NodeKey, NodeRole};
pub use pdata::{AnySignal, LogData, MetricData, Record, TraceData};
pub use pipelines::{PipelineView, Pipelines};
