//! The observer registry (C7, notification half): callbacks attached to a
//! [`crate::engine::ValidationEngine`] and notified once it reaches a
//! terminal state.
//!
//! Scoped to a single engine instance rather than kept process-wide — the
//! original Readium client keeps a single static list of delegates shared
//! across every in-flight license, which is the kind of cross-run leakage
//! spec.md §9 calls out for correction.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::document::ValidatedDocuments;
use crate::error::LcpError;

/// Whether an observer is removed after its first notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverPolicy {
    /// Notified once, then dropped from the registry.
    Once,
    /// Retained across notifications.
    Always,
}

/// The terminal outcome of a validation run, as delivered to observers.
/// Exactly one of [`Outcome::documents`] / [`Outcome::error`] is populated
/// on `Valid` / `Failure`; both are `None` on `Cancelled`.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The run reached [`crate::state::State::Valid`].
    Valid(ValidatedDocuments),
    /// The run reached [`crate::state::State::Failure`].
    Failure(Arc<LcpError>),
    /// The run reached [`crate::state::State::Cancelled`].
    Cancelled,
}

impl Outcome {
    /// The validated documents, if the run succeeded.
    pub fn documents(&self) -> Option<ValidatedDocuments> {
        match self {
            Self::Valid(docs) => Some(docs.clone()),
            Self::Failure(_) | Self::Cancelled => None,
        }
    }

    /// The failure, if the run failed.
    pub fn error(&self) -> Option<Arc<LcpError>> {
        match self {
            Self::Failure(e) => Some(e.clone()),
            Self::Valid(_) | Self::Cancelled => None,
        }
    }
}

/// A registered observer's callback: `(documents, error)`, mirroring
/// spec.md §6's `(ValidatedDocuments?, Error?) -> ()` contract.
pub type ObserverFn = dyn FnMut(Option<ValidatedDocuments>, Option<Arc<LcpError>>) + Send;

struct Entry {
    policy: ObserverPolicy,
    callback: Box<ObserverFn>,
}

#[derive(Default)]
struct Inner {
    observers: Vec<Entry>,
    last_outcome: Option<Outcome>,
}

/// Engine-local registry of terminal-state observers.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Mutex<Inner>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `callback` with `policy`. If the engine already reached a
    /// terminal state, `callback` is invoked synchronously with the cached
    /// outcome; a `Once` observer is never registered in that case, while
    /// an `Always` observer is registered in addition (so it also hears
    /// about any later terminal entry reachable via [`Self::notify`]).
    pub async fn attach(&self, policy: ObserverPolicy, mut callback: Box<ObserverFn>) {
        let mut inner = self.inner.lock().await;
        if let Some(outcome) = inner.last_outcome.clone() {
            callback(outcome.documents(), outcome.error());
            if policy == ObserverPolicy::Once {
                return;
            }
        }
        inner.observers.push(Entry { policy, callback });
    }

    /// Notifies every registered observer, in registration order, then
    /// prunes `Once` observers.
    pub async fn notify(&self, outcome: Outcome) {
        let mut inner = self.inner.lock().await;
        inner.last_outcome = Some(outcome.clone());
        let mut remaining = Vec::with_capacity(inner.observers.len());
        for mut entry in inner.observers.drain(..) {
            (entry.callback)(outcome.documents(), outcome.error());
            if entry.policy == ObserverPolicy::Always {
                remaining.push(entry);
            }
        }
        inner.observers = remaining;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn once_observer_fires_exactly_once() {
        let registry = ObserverRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        registry
            .attach(
                ObserverPolicy::Once,
                Box::new(move |_, _| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;
        registry.notify(Outcome::Cancelled).await;
        registry.notify(Outcome::Cancelled).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn late_attach_to_terminal_engine_notifies_synchronously() {
        let registry = ObserverRegistry::new();
        registry.notify(Outcome::Cancelled).await;
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        registry
            .attach(
                ObserverPolicy::Once,
                Box::new(move |_, _| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn always_observer_survives_and_rehears_future_notifications() {
        let registry = ObserverRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        registry
            .attach(
                ObserverPolicy::Always,
                Box::new(move |_, _| {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;
        registry.notify(Outcome::Cancelled).await;
        registry.notify(Outcome::Cancelled).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
