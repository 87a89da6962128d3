//! Expectation Registry
//!
//! A concurrent map of per-key condition cells. The bus listener and the
//! saga workers touch it from independent tasks; each key carries its own
//! state and wakeup so a signal for one expectation never races another.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Duration, Instant};

/// Identifies one expected asynchronous acknowledgment
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub tenant_identifier: String,
    pub operation: String,
    pub correlation: String,
}

impl EventKey {
    pub fn new(
        tenant_identifier: impl Into<String>,
        operation: impl Into<String>,
        correlation: impl Into<String>,
    ) -> Self {
        Self {
            tenant_identifier: tenant_identifier.into(),
            operation: operation.into(),
            correlation: correlation.into(),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tenant_identifier, self.operation, self.correlation
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExpectationState {
    Pending,
    Found,
    Withdrawn,
}

struct ExpectationCell {
    state: Mutex<ExpectationState>,
    notify: Notify,
}

impl ExpectationCell {
    fn resolve(&self, state: ExpectationState) {
        *self.state.lock() = state;
        self.notify.notify_waiters();
    }
}

/// A handle on one pending acknowledgment
pub struct EventExpectation {
    key: EventKey,
    cell: Arc<ExpectationCell>,
    expectations: Arc<DashMap<EventKey, Arc<ExpectationCell>>>,
}

impl EventExpectation {
    pub fn key(&self) -> &EventKey {
        &self.key
    }

    /// Block until the acknowledgment arrives, the expectation is
    /// withdrawn, or `timeout` elapses. True only if the acknowledgment
    /// arrived in time. The expectation removes itself from the registry
    /// on every exit path.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            // The notified() future is created before the state check so a
            // signal landing between the check and the await still wakes us.
            let notified = self.cell.notify.notified();

            match *self.cell.state.lock() {
                ExpectationState::Found => {
                    self.remove_self();
                    return true;
                }
                ExpectationState::Withdrawn => {
                    self.remove_self();
                    return false;
                }
                ExpectationState::Pending => {}
            }

            if timeout_at(deadline, notified).await.is_err() {
                self.remove_self();
                return false;
            }
        }
    }

    fn remove_self(&self) {
        self.expectations
            .remove_if(&self.key, |_, cell| Arc::ptr_eq(cell, &self.cell));
    }
}

impl fmt::Debug for EventExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventExpectation({})", self.key)
    }
}

/// Concurrent registry of pending expectations, keyed by [`EventKey`]
#[derive(Clone, Default)]
pub struct EventRegistry {
    expectations: Arc<DashMap<EventKey, Arc<ExpectationCell>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending expectation. A duplicate key displaces the
    /// earlier registration; the displaced waiter simply times out.
    pub fn expect(&self, key: EventKey) -> EventExpectation {
        let cell = Arc::new(ExpectationCell {
            state: Mutex::new(ExpectationState::Pending),
            notify: Notify::new(),
        });
        self.expectations.insert(key.clone(), cell.clone());

        EventExpectation {
            key,
            cell,
            expectations: self.expectations.clone(),
        }
    }

    /// Deliver an acknowledgment: atomically remove the matching
    /// expectation and wake its waiter. Acknowledgments nobody expects are
    /// dropped; expectations are registered before the producing call, so
    /// an unmatched event belongs to some other actor's operation.
    pub fn notify(&self, key: &EventKey) {
        match self.expectations.remove(key) {
            Some((_, cell)) => cell.resolve(ExpectationState::Found),
            None => tracing::debug!(event = %key, "acknowledgment without a registered expectation"),
        }
    }

    /// Withdraw a pending expectation, waking any waiter immediately with
    /// a negative result. Used when the producing call failed and no
    /// acknowledgment will ever arrive.
    pub fn withdraw(&self, expectation: &EventExpectation) {
        self.expectations
            .remove_if(&expectation.key, |_, cell| Arc::ptr_eq(cell, &expectation.cell));
        expectation.cell.resolve(ExpectationState::Withdrawn);
    }

    pub fn pending_count(&self) -> usize {
        self.expectations.len()
    }
}
