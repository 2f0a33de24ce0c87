// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The [`Consumer`] trait every node exposes as its downstream entry point,
//! and [`Splitter`], the mutation-aware multi-consumer fan-out used both by
//! the named per-pipeline fan-out node and by any receiver/connector that
//! feeds more than one destination (see §3.2 of the design).

use crate::context::Context;
use crate::error::ConsumeError;
use crate::pdata::AnySignal;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// The object that receives data of a node's upstream signal kind. Every
/// node variant exposes one of these as its consumer accessor; for a true
/// receiver it is also the injection point an external driver calls to
/// simulate ingress.
pub trait Consumer: Send + Sync {
    /// Whether this consumer mutates the payload it is handed in place.
    /// Governs the copy policy of whatever feeds it (see [`Splitter`]).
    /// Defaults to `false`: only processors, exporters, and connectors that
    /// actually mutate in place need to override this.
    fn mutates_data(&self) -> bool {
        false
    }

    /// Hands `data` to this consumer. Runtime errors are propagated
    /// unchanged to the caller; the engine itself never retries, buffers, or
    /// transforms them.
    fn consume(&self, ctx: &Context, data: AnySignal) -> Result<(), ConsumeError>;
}

/// A branch of a [`Splitter`]: a downstream consumer plus the `mutates_data`
/// flag it had at build time (captured once rather than re-queried per
/// call).
#[derive(Clone)]
struct Branch {
    consumer: Arc<dyn Consumer>,
    mutates: bool,
}

/// Forwards one payload to N downstream consumers under the copy policy in
/// §4.5: a single downstream consumer is forwarded to directly; otherwise
/// every branch that declares `mutates_data` gets an independent deep copy,
/// and every other branch shares the original allocation. Holds no mutable
/// state, so it is trivially safe for concurrent callers.
pub struct Splitter {
    branches: Vec<Branch>,
}

impl Splitter {
    /// Builds a splitter over the given downstream consumers, snapshotting
    /// each one's `mutates_data` flag now.
    #[must_use]
    pub fn new(consumers: Vec<Arc<dyn Consumer>>) -> Self {
        let branches = consumers
            .into_iter()
            .map(|consumer| {
                let mutates = consumer.mutates_data();
                Branch { consumer, mutates }
            })
            .collect();
        Self { branches }
    }

    /// Number of downstream branches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Whether there are no downstream branches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Wraps `consumers` as a single `Arc<dyn Consumer>`, skipping the
    /// splitter entirely when there is exactly one branch (the `N == 1`
    /// case in §4.5 forwards without any copying machinery at all).
    #[must_use]
    pub fn assemble(mut consumers: Vec<Arc<dyn Consumer>>) -> Arc<dyn Consumer> {
        if consumers.len() == 1 {
            return consumers.pop().unwrap_or_else(|| unreachable!());
        }
        Arc::new(Self::new(consumers))
    }
}

impl Consumer for Splitter {
    fn consume(&self, ctx: &Context, data: AnySignal) -> Result<(), ConsumeError> {
        if self.branches.len() == 1 {
            return self.branches[0].consumer.consume(ctx, data);
        }

        let mut errors: Vec<ConsumeError> = Vec::new();
        for branch in &self.branches {
            let branch_data = if branch.mutates {
                data.deep_copy()
            } else {
                data.share()
            };
            if let Err(err) = branch.consumer.consume(ctx, branch_data) {
                errors.push(err);
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Box::new(MultiConsumeError(errors))),
        }
    }
}

/// Aggregates more than one branch failure from a single fan-out call.
#[derive(Debug)]
struct MultiConsumeError(Vec<ConsumeError>);

impl fmt::Display for MultiConsumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fan-out branches failed: ", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl StdError for MultiConsumeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdata::{Record, TraceData};
    use std::sync::Mutex;

    struct RecordingConsumer {
        mutates: bool,
        received: Mutex<Vec<AnySignal>>,
    }

    impl RecordingConsumer {
        fn new(mutates: bool) -> Self {
            Self {
                mutates,
                received: Mutex::new(Vec::new()),
            }
        }
    }

    impl Consumer for RecordingConsumer {
        fn mutates_data(&self) -> bool {
            self.mutates
        }

        fn consume(&self, _ctx: &Context, data: AnySignal) -> Result<(), ConsumeError> {
            self.received.lock().unwrap_or_else(|e| e.into_inner()).push(data);
            Ok(())
        }
    }

    #[test]
    fn single_branch_forwards_without_copy() {
        let sink = Arc::new(RecordingConsumer::new(true));
        let splitter = Splitter::assemble(vec![sink.clone()]);
        let ctx = Context::new();
        let payload = AnySignal::Traces(TraceData::new(vec![Record::named("a")]));
        splitter.consume(&ctx, payload.clone()).unwrap();
        let received = sink.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        if let (AnySignal::Traces(original), AnySignal::Traces(got)) = (&payload, &received[0]) {
            assert!(original.is_shared_with(got));
        } else {
            panic!("expected traces");
        }
    }

    #[test]
    fn non_mutating_branches_share_mutating_branches_copy() {
        let shared_a = Arc::new(RecordingConsumer::new(false));
        let shared_b = Arc::new(RecordingConsumer::new(false));
        let mutator = Arc::new(RecordingConsumer::new(true));
        let splitter = Splitter::new(vec![shared_a.clone(), shared_b.clone(), mutator.clone()]);

        let ctx = Context::new();
        let payload = AnySignal::Traces(TraceData::new(vec![Record::named("a")]));
        splitter.consume(&ctx, payload.clone()).unwrap();

        let a = shared_a.received.lock().unwrap();
        let b = shared_b.received.lock().unwrap();
        let m = mutator.received.lock().unwrap();

        let (AnySignal::Traces(pa), AnySignal::Traces(pb), AnySignal::Traces(pm)) =
            (&a[0], &b[0], &m[0])
        else {
            panic!("expected traces");
        };
        assert!(pa.is_shared_with(pb), "non-mutating branches should share");
        assert!(!pa.is_shared_with(pm), "mutating branch should get its own copy");
        assert_eq!(pa.records(), pm.records());
    }

    #[test]
    fn all_mutating_branches_each_get_independent_copies() {
        let first = Arc::new(RecordingConsumer::new(true));
        let second = Arc::new(RecordingConsumer::new(true));
        let splitter = Splitter::new(vec![first.clone(), second.clone()]);

        let ctx = Context::new();
        let payload = AnySignal::Logs(crate::pdata::LogData::new(vec![Record::named("l")]));
        splitter.consume(&ctx, payload).unwrap();

        let a = first.received.lock().unwrap();
        let b = second.received.lock().unwrap();
        let (AnySignal::Logs(pa), AnySignal::Logs(pb)) = (&a[0], &b[0]) else {
            panic!("expected logs");
        };
        assert!(!pa.is_shared_with(pb));
    }
}
