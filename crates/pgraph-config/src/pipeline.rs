// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Pipeline identity and the ordered receiver/processor/exporter lists that
//! make up a single pipeline's configuration.

use crate::component::ComponentId;
use crate::error::Error;
use crate::signal::SignalKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Uniquely names a pipeline: a signal kind plus a disambiguating name.
///
/// Textual form is `signal` when the name is empty, or `signal/name`
/// otherwise. The `/*` suffix used in error messages (see
/// [`PipelineId::shared_display`]) is not part of this type's own `Display`
/// impl; it marks a role (receiver/exporter) that is shared across the whole
/// signal bus rather than naming one specific pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineId {
    signal: SignalKind,
    name: Cow<'static, str>,
}

impl PipelineId {
    /// Builds a pipeline id from a signal kind and an optional name.
    #[must_use]
    pub fn new(signal: SignalKind, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            signal,
            name: name.into(),
        }
    }

    /// Builds a pipeline id with an empty name.
    #[must_use]
    pub fn from_signal(signal: SignalKind) -> Self {
        Self::new(signal, "")
    }

    /// The pipeline's signal kind.
    #[must_use]
    pub fn signal(&self) -> SignalKind {
        self.signal
    }

    /// The disambiguating name, empty for the default pipeline of a signal.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `<signal>/*` form used in error messages for receiver/exporter
    /// failures, which are reported against the whole signal bus rather
    /// than one named pipeline.
    #[must_use]
    pub fn shared_display(&self) -> String {
        format!("{}/*", self.signal)
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.signal)
        } else {
            write!(f, "{}/{}", self.signal, self.name)
        }
    }
}

/// The ordered receiver, processor, and exporter lists that make up one
/// pipeline's configuration.
///
/// `receivers` and `exporters` may reference connector ids, which resolve to
/// a connector node that is simultaneously a sink in one pipeline and a
/// source in another; `processors` may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ordered list of receiver (or connector-as-receiver) ids.
    pub receivers: Vec<ComponentId>,
    /// Ordered list of processor ids; may be empty.
    pub processors: Vec<ComponentId>,
    /// Ordered list of exporter (or connector-as-exporter) ids.
    pub exporters: Vec<ComponentId>,
}

impl PipelineConfig {
    /// Checks the structural shape required for this pipeline to be
    /// buildable at all: at least one receiver and at least one exporter.
    pub fn validate(&self, id: &PipelineId) -> Result<(), Error> {
        if self.receivers.is_empty() {
            return Err(Error::EmptyRole {
                pipeline: id.to_string(),
                role: "receivers",
            });
        }
        if self.exporters.is_empty() {
            return Err(Error::EmptyRole {
                pipeline: id.to_string(),
                role: "exporters",
            });
        }
        Ok(())
    }
}

/// An ordered map from pipeline id to pipeline configuration.
///
/// Declaration order is preserved (not just key order) so enumeration and
/// diagnostics are deterministic across builds of the same configuration.
pub type PipelinesConfig = IndexMap<PipelineId, PipelineConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_empty_name() {
        assert_eq!(PipelineId::from_signal(SignalKind::Traces).to_string(), "traces");
        assert_eq!(
            PipelineId::new(SignalKind::Traces, "in").to_string(),
            "traces/in"
        );
    }

    #[test]
    fn shared_display_uses_signal_only() {
        let id = PipelineId::new(SignalKind::Metrics, "custom");
        assert_eq!(id.shared_display(), "metrics/*");
    }

    #[test]
    fn validate_rejects_empty_roles() {
        let id = PipelineId::from_signal(SignalKind::Logs);
        let empty = PipelineConfig::default();
        assert!(empty.validate(&id).is_err());
    }
}
