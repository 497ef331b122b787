//! Relay operation identity and in-flight tracking.
//!
//! # Responsibilities
//! - Generate unique relay IDs for tracing
//! - Enforce the in-flight ceiling (`listener.max_connections`)
//! - Let shutdown wait for in-flight relays to drain
//! - Notice relays abandoned by the caller before completion

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

/// Global atomic counter for relay IDs.
/// Relaxed ordering is enough since only uniqueness matters.
static RELAY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one relay operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayId(u64);

impl RelayId {
    pub fn new() -> Self {
        Self(RELAY_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for RelayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "relay-{}", self.0)
    }
}

/// Counts relay operations from dispatch until the last body byte.
///
/// Cloning shares the same counter and ceiling.
#[derive(Debug, Clone)]
pub struct InFlightTracker {
    active: Arc<AtomicU64>,
    slots: Arc<Semaphore>,
    max_in_flight: usize,
}

impl InFlightTracker {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            active: Arc::new(AtomicU64::new(0)),
            slots: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// Claim a slot, or `None` when the ceiling is reached.
    pub fn try_track(&self) -> Option<InFlightGuard> {
        let permit = self.slots.clone().try_acquire_owned().ok()?;
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_in_flight(now);

        Some(InFlightGuard {
            active: Arc::clone(&self.active),
            id: RelayId::new(),
            completed: false,
            _permit: permit,
        })
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Wait until every relay has finished, or `deadline` passes.
    /// Returns whether the tracker drained.
    pub async fn drain(&self, deadline: Duration) -> bool {
        let wait = async {
            while self.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        tokio::time::timeout(deadline, wait).await.is_ok()
    }
}

/// Held for the lifetime of one relay operation. Releases its slot on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
    id: RelayId,
    completed: bool,
    _permit: OwnedSemaphorePermit,
}

impl InFlightGuard {
    pub fn id(&self) -> RelayId {
        self.id
    }

    /// Mark the relay as having reached a terminal state.
    pub fn complete(&mut self) {
        self.completed = true;
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::set_in_flight(now);

        if self.completed {
            tracing::trace!(relay_id = %self.id, "Relay finished");
        } else {
            tracing::info!(relay_id = %self.id, "Caller went away, outbound side dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_id_unique() {
        let id1 = RelayId::new();
        let id2 = RelayId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("relay-"));
    }

    #[test]
    fn tracker_counts() {
        let tracker = InFlightTracker::new(10);
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.try_track().unwrap();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.try_track().unwrap();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn ceiling_rejects_until_a_slot_frees() {
        let tracker = InFlightTracker::new(1);
        let held = tracker.try_track().unwrap();
        assert!(tracker.try_track().is_none());

        drop(held);
        assert!(tracker.try_track().is_some());
    }

    #[test]
    fn completion_flag() {
        let tracker = InFlightTracker::new(1);
        let mut guard = tracker.try_track().unwrap();
        assert!(!guard.is_complete());
        guard.complete();
        assert!(guard.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_guards() {
        let tracker = InFlightTracker::new(4);
        let guard = tracker.try_track().unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            drop(guard);
        });

        assert!(tracker.drain(Duration::from_secs(5)).await);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_at_deadline() {
        let tracker = InFlightTracker::new(4);
        let _guard = tracker.try_track().unwrap();
        assert!(!tracker.drain(Duration::from_secs(1)).await);
    }
}
