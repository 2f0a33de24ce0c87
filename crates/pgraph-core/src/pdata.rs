// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! Placeholder signal payload types.
//!
//! The actual OTLP-shaped span/metric/log record bodies are an external
//! collaborator (see §1/§3 of the design: "the underlying signal payload
//! types" are explicitly out of scope). What this core needs from a payload
//! is only: cheap sharing (an `Arc`-backed reference can be handed to
//! several consumers) and an explicit, observable deep copy (so mutation
//! isolation between fan-out branches can be tested by identity, not just by
//! content). [`TraceData`], [`MetricData`], and [`LogData`] are minimal
//! stand-ins with exactly those two properties.

use std::sync::Arc;

/// One record carried by a signal payload: a name plus a small attribute
/// bag. Stands in for the real OTLP span/datapoint/log-record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The record's name (span name, metric name, or log body).
    pub name: String,
    /// Free-form string attributes attached to the record.
    pub attributes: Vec<(String, String)>,
}

impl Record {
    /// Builds a record with no attributes.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }
}

macro_rules! signal_payload {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone)]
        pub struct $name(pub Arc<Vec<Record>>);

        impl $name {
            /// Wraps a vector of records as a shareable payload.
            #[must_use]
            pub fn new(records: Vec<Record>) -> Self {
                Self(Arc::new(records))
            }

            /// Returns a cheap, reference-counted clone: the result is
            /// `Arc::ptr_eq` to `self`, i.e. the same allocation.
            #[must_use]
            pub fn share(&self) -> Self {
                Self(Arc::clone(&self.0))
            }

            /// Returns an independent deep copy: the result is never
            /// `Arc::ptr_eq` to `self`, even though the contents are equal.
            #[must_use]
            pub fn deep_copy(&self) -> Self {
                Self(Arc::new((*self.0).clone()))
            }

            /// Whether `self` and `other` point at the same allocation.
            #[must_use]
            pub fn is_shared_with(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }

            /// The records carried by this payload.
            #[must_use]
            pub fn records(&self) -> &[Record] {
                &self.0
            }
        }
    };
}

signal_payload!(TraceData, "A stand-in for a batch of spans.");
signal_payload!(MetricData, "A stand-in for a batch of metric data points.");
signal_payload!(LogData, "A stand-in for a batch of log records.");

/// A signal payload tagged with the kind it carries, so a single `Consumer`
/// implementation can sit at the boundary between pipelines of different
/// kinds (connectors) without the graph itself being generic over a payload
/// type.
#[derive(Debug, Clone)]
pub enum AnySignal {
    /// A batch of spans.
    Traces(TraceData),
    /// A batch of metric data points.
    Metrics(MetricData),
    /// A batch of log records.
    Logs(LogData),
}

impl AnySignal {
    /// The signal kind this payload carries.
    #[must_use]
    pub fn kind(&self) -> pgraph_config::SignalKind {
        match self {
            AnySignal::Traces(_) => pgraph_config::SignalKind::Traces,
            AnySignal::Metrics(_) => pgraph_config::SignalKind::Metrics,
            AnySignal::Logs(_) => pgraph_config::SignalKind::Logs,
        }
    }

    /// A cheap, reference-counted clone (see `share` on the concrete types).
    #[must_use]
    pub fn share(&self) -> Self {
        match self {
            AnySignal::Traces(t) => AnySignal::Traces(t.share()),
            AnySignal::Metrics(m) => AnySignal::Metrics(m.share()),
            AnySignal::Logs(l) => AnySignal::Logs(l.share()),
        }
    }

    /// An independent deep copy (see `deep_copy` on the concrete types).
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            AnySignal::Traces(t) => AnySignal::Traces(t.deep_copy()),
            AnySignal::Metrics(m) => AnySignal::Metrics(m.deep_copy()),
            AnySignal::Logs(l) => AnySignal::Logs(l.deep_copy()),
        }
    }

    /// Whether `self` and `other` are the same allocation. Returns `false`
    /// for mismatched kinds rather than panicking.
    #[must_use]
    pub fn is_shared_with(&self, other: &Self) -> bool {
        match (self, other) {
            (AnySignal::Traces(a), AnySignal::Traces(b)) => a.is_shared_with(b),
            (AnySignal::Metrics(a), AnySignal::Metrics(b)) => a.is_shared_with(b),
            (AnySignal::Logs(a), AnySignal::Logs(b)) => a.is_shared_with(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_is_same_allocation() {
        let original = TraceData::new(vec![Record::named("span")]);
        let shared = original.share();
        assert!(original.is_shared_with(&shared));
    }

    #[test]
    fn deep_copy_is_different_allocation_same_contents() {
        let original = TraceData::new(vec![Record::named("span")]);
        let copy = original.deep_copy();
        assert!(!original.is_shared_with(&copy));
        assert_eq!(original.records(), copy.records());
    }
}
