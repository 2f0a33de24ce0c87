// Copyright The OpenTelemetry Authors
// SPDX-License-Identifier: Apache-2.0

//! The context threaded through `start`/`shutdown`: an optional deadline
//! plus a cooperative cancellation flag. Nodes are expected to honour it
//! when possible; the driver never force-kills a node.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Carries a deadline and cancellation signal across a `start`/`shutdown`
/// call tree. Cheap to clone: the cancellation flag is shared.
#[derive(Clone, Debug)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context with no deadline, not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle that can cancel this context (and every clone of it) from
    /// another thread.
    #[must_use]
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle(Arc::clone(&self.cancelled))
    }

    /// Whether the context's deadline, if any, has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Whether the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the context is done, either via deadline or cancellation.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_expired() || self.is_cancelled()
    }
}

/// A detached handle that can cancel the [`Context`] it was taken from.
#[derive(Clone, Debug)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    /// Marks the associated context as cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Collaborator supplied to every node's `start` call. Mirrors the minimal
/// slice of `component.Host` this core actually needs: a place to report an
/// unrecoverable runtime error observed after start-up has already returned.
pub trait Host: Send + Sync {
    /// Reports an error that a node cannot recover from on its own, after
    /// the pipeline has already started (e.g. a background task failing).
    fn report_fatal_error(&self, error: &(dyn std::error::Error + Send + Sync + 'static));
}

/// A [`Host`] that drops every reported error after logging it. Useful for
/// tests and for drivers that have no richer host to offer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopHost;

impl Host for NopHost {
    fn report_fatal_error(&self, error: &(dyn std::error::Error + Send + Sync + 'static)) {
        tracing::error!(%error, "fatal error reported to host");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancellation_handle_propagates() {
        let ctx = Context::new();
        let handle = ctx.cancellation_handle();
        assert!(!ctx.is_cancelled());
        handle.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn deadline_expires() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(ctx.is_expired());
        assert!(ctx.is_done());
    }
}
