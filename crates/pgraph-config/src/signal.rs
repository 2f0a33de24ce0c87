// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The three signal kinds a pipeline can carry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A telemetry signal kind. Every pipeline carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// A stream of spans.
    Traces,
    /// A stream of metric data points.
    Metrics,
    /// A stream of log records.
    Logs,
}

impl SignalKind {
    /// Returns the lower-case name used in pipeline ids and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Traces => "traces",
            SignalKind::Metrics => "metrics",
            SignalKind::Logs => "logs",
        }
    }

    /// All three signal kinds, in a stable order.
    #[must_use]
    pub const fn all() -> [SignalKind; 3] {
        [SignalKind::Traces, SignalKind::Metrics, SignalKind::Logs]
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        for kind in SignalKind::all() {
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
