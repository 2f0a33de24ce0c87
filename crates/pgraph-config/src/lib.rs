// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Typed configuration data model for the telemetry pipeline graph engine.
//!
//! Data Model:
//! - pipelines config
//!   - pipeline id (signal kind + name)
//!     - pipeline config
//!       - receivers (ordered component ids)
//!       - processors (ordered component ids)
//!       - exporters (ordered component ids)
//!
//! This crate only carries the shapes that `pgraph-core` needs to build a
//! graph. Reading these shapes out of a configuration file (YAML, TOML, ...)
//! is an external concern; every type here derives `serde::Deserialize` so an
//! external loader can populate them directly.

mod component;
mod error;
mod pipeline;
mod signal;

pub use component::ComponentId;
pub use error::Error;
pub use pipeline::{PipelineConfig, PipelineId, PipelinesConfig};
pub use signal::SignalKind;
