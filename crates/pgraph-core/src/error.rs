// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! All errors the graph engine can return, including the fixed compatibility
//! strings produced at build time.
//!
//! Important note: avoid `!Send` data in error payloads so these can cross
//! thread boundaries in `start_all`/`shutdown_all` without trouble.

use pgraph_config::SignalKind;
use std::fmt;

/// A boxed runtime error returned from a consumer. Runtime errors are
/// propagated unchanged to the caller; the engine never retries, buffers, or
/// transforms them, so no dedicated wrapper type is introduced here.
pub type ConsumeError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Formats the `source()` chain of an error into a single diagnostic string,
/// for attaching extra context to a log line without losing the original
/// message.
#[must_use]
pub fn format_error_sources(error: &(dyn std::error::Error + 'static)) -> String {
    let mut segments = Vec::new();
    let mut current = error.source();
    while let Some(err) = current {
        segments.push(err.to_string());
        current = err.source();
    }
    if segments.is_empty() {
        String::new()
    } else {
        format!("; source: {}", segments.join(" -> "))
    }
}

/// All errors that can occur while building or driving the pipeline graph.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The requested signal kind is not one a receiver/processor/exporter's
    /// factory supports.
    #[error(
        "failed to create \"{id}\" {role}, in pipeline \"{pipeline}\": telemetry type is not supported"
    )]
    UnsupportedSignal {
        /// The component id that failed to build.
        id: String,
        /// `"receiver"`, `"processor"`, or `"exporter"`.
        role: &'static str,
        /// The pipeline context the failure is reported against.
        pipeline: String,
    },

    /// No settings were registered for this component id.
    #[error(
        "failed to create \"{id}\" {role}, in pipeline \"{pipeline}\": {role} \"{id}\" is not configured"
    )]
    NotConfigured {
        /// The component id with no registered settings.
        id: String,
        /// The node's role.
        role: &'static str,
        /// The pipeline context the failure is reported against.
        pipeline: String,
    },

    /// No factory is registered for this component type.
    #[error(
        "failed to create \"{id}\" {role}, in pipeline \"{pipeline}\": {role} factory not available for: \"{type_}\""
    )]
    FactoryNotAvailable {
        /// The component id that failed to build.
        id: String,
        /// `"receiver"`, `"processor"`, or `"exporter"`.
        role: &'static str,
        /// The pipeline context the failure is reported against.
        pipeline: String,
        /// The component type with no registered factory.
        type_: String,
    },

    /// A connector's factory does not support the requested from/to signal
    /// kind pair.
    #[error("connector \"{id}\" cannot connect from {from} to {to}: telemetry type is not supported")]
    ConnectorUnsupportedSignal {
        /// The connector's component id.
        id: String,
        /// The source pipeline's signal kind.
        from: SignalKind,
        /// The destination pipeline's signal kind.
        to: SignalKind,
    },

    /// No connector factory is registered for this component type.
    #[error("connector factory not available for: \"{type_}\"")]
    ConnectorFactoryNotAvailable {
        /// The component type with no registered factory.
        type_: String,
    },

    /// The graph contains a cycle; no component was instantiated.
    #[error("topo: no topological ordering: cyclic components: {count} nodes in 1 cyclic components")]
    Cyclic {
        /// The number of nodes that could not be placed in topological order.
        count: usize,
    },

    /// A pipeline failed shape validation before the graph was even built.
    #[error(transparent)]
    Config(#[from] pgraph_config::Error),

    /// A factory's `build` call itself returned an error, distinct from the
    /// three compatibility-relevant forms above (missing factory, missing
    /// config, unsupported signal kind).
    #[error("failed to create \"{id}\" {role}, in pipeline \"{pipeline}\": {source}")]
    Build {
        /// The component id that failed to build.
        id: String,
        /// The node's role.
        role: &'static str,
        /// The pipeline context the failure is reported against.
        pipeline: String,
        /// The factory's own error.
        #[source]
        source: ConsumeError,
    },

    /// A node's `start` returned an error.
    #[error("start failed for \"{node}\" {role}{sources}")]
    Start {
        /// The node's key, formatted for display.
        node: String,
        /// The node's role.
        role: &'static str,
        /// The component's own error.
        #[source]
        source: ConsumeError,
        /// Cached `source()` chain of `source`, rendered once at
        /// construction since `ConsumeError` is not `Clone`.
        sources: SourceChainDisplay,
    },

    /// A node's `shutdown` returned an error. On `shutdown_all` the first
    /// such error is returned; the rest are logged (see module docs on the
    /// engine's shutdown aggregation policy).
    #[error("shutdown failed for \"{node}\" {role}{sources}")]
    Shutdown {
        /// The node's key, formatted for display.
        node: String,
        /// The node's role.
        role: &'static str,
        /// The component's own error.
        #[source]
        source: ConsumeError,
        /// Cached `source()` chain of `source`.
        sources: SourceChainDisplay,
    },
}

impl Error {
    /// Builds a [`Error::Start`] from a node's key/role and its own error.
    #[must_use]
    pub fn start_failed(node: impl fmt::Display, role: &'static str, source: ConsumeError) -> Self {
        let sources = SourceChainDisplay(format_error_sources(source.as_ref()));
        Error::Start {
            node: node.to_string(),
            role,
            source,
            sources,
        }
    }

    /// Builds a [`Error::Shutdown`] from a node's key/role and its own error.
    #[must_use]
    pub fn shutdown_failed(node: impl fmt::Display, role: &'static str, source: ConsumeError) -> Self {
        let sources = SourceChainDisplay(format_error_sources(source.as_ref()));
        Error::Shutdown {
            node: node.to_string(),
            role,
            source,
            sources,
        }
    }
}

/// Pre-rendered `source()` chain, `": ..."`-prefixed display, or empty.
#[derive(Debug)]
pub struct SourceChainDisplay(String);

impl fmt::Display for SourceChainDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
