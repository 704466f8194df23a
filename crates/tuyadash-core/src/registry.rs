// ── Device poller registry ──
//
// One cancellation context per device. Registering a device tears down
// whatever was polling it before; completion releases only the context it
// registered, tracked by a generation number, so a slow loop finishing late
// never evicts its successor.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::model::DeviceId;

#[derive(Debug)]
struct PollerEntry {
    generation: u64,
    cancel: CancellationToken,
}

/// Handle to a registered polling context.
#[derive(Debug, Clone)]
pub struct PollerHandle {
    device_id: DeviceId,
    generation: u64,
    token: CancellationToken,
}

impl PollerHandle {
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Token attached to every request and delay of this context.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Process-local map of device id to its active polling context.
#[derive(Debug, Default)]
pub struct PollerRegistry {
    pollers: DashMap<DeviceId, PollerEntry>,
    next_generation: AtomicU64,
    root: CancellationToken,
}

impl PollerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose contexts are all children of `parent`.
    ///
    /// Cancelling `parent` cancels every current and future context.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            root: parent.child_token(),
            ..Self::default()
        }
    }

    /// Cancel any existing context for `id` and store a fresh one.
    pub fn register(&self, id: &DeviceId) -> PollerHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        let previous = self.pollers.insert(
            id.clone(),
            PollerEntry {
                generation,
                cancel: token.clone(),
            },
        );
        if let Some(previous) = previous {
            trace!(device = %id, generation = previous.generation, "superseding poller");
            previous.cancel.cancel();
        }
        PollerHandle {
            device_id: id.clone(),
            generation,
            token,
        }
    }

    /// Signal cancellation to the context for `id` and drop it.
    ///
    /// Returns `true` if a context existed. Calling it again is a no-op.
    pub fn cancel(&self, id: &DeviceId) -> bool {
        match self.pollers.remove(id) {
            Some((_, entry)) => {
                trace!(device = %id, generation = entry.generation, "poller cancelled");
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `handle`, unless a newer context replaced it.
    pub fn release(&self, handle: &PollerHandle) -> bool {
        self.pollers
            .remove_if(&handle.device_id, |_, entry| {
                entry.generation == handle.generation
            })
            .is_some()
    }

    pub fn is_active(&self, id: &DeviceId) -> bool {
        self.pollers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pollers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pollers.is_empty()
    }

    /// Cancel and drop every context.
    pub fn cancel_all(&self) {
        self.pollers.retain(|_, entry| {
            entry.cancel.cancel();
            false
        });
    }

    /// Cancel then register `id`, releasing the entry when the guard drops.
    pub(crate) fn activate(&self, id: &DeviceId) -> ActivePoller<'_> {
        self.cancel(id);
        ActivePoller {
            registry: self,
            handle: self.register(id),
        }
    }
}

/// A registered context that releases itself on drop.
pub(crate) struct ActivePoller<'a> {
    registry: &'a PollerRegistry,
    handle: PollerHandle,
}

impl ActivePoller<'_> {
    pub(crate) fn token(&self) -> &CancellationToken {
        self.handle.token()
    }
}

impl Drop for ActivePoller<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DeviceId {
        DeviceId::from(s)
    }

    #[test]
    fn re_registering_keeps_one_entry_and_cancels_the_old() {
        let registry = PollerRegistry::new();
        let first = registry.register(&id("d1"));
        let second = registry.register(&id("d1"));

        assert_eq!(registry.len(), 1);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn superseded_context_wakes_its_waiter() {
        let registry = PollerRegistry::new();
        let first = registry.register(&id("d1"));
        let mut waiter = tokio_test::task::spawn(first.token().cancelled());

        tokio_test::assert_pending!(waiter.poll());

        let _second = registry.register(&id("d1"));

        assert!(waiter.is_woken());
        tokio_test::assert_ready!(waiter.poll());
    }

    #[test]
    fn cancel_is_idempotent() {
        let registry = PollerRegistry::new();
        let handle = registry.register(&id("d1"));

        assert!(registry.cancel(&id("d1")));
        assert!(handle.is_cancelled());
        assert!(!registry.cancel(&id("d1")));
        assert!(!registry.cancel(&id("never")));
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_release_keeps_newer_context() {
        let registry = PollerRegistry::new();
        let stale = registry.register(&id("d1"));
        let fresh = registry.register(&id("d1"));

        assert!(!registry.release(&stale));
        assert!(registry.is_active(&id("d1")));
        assert!(registry.release(&fresh));
        assert!(!registry.is_active(&id("d1")));
    }

    #[test]
    fn cancel_all_clears_everything() {
        let registry = PollerRegistry::new();
        let a = registry.register(&id("a"));
        let b = registry.register(&id("b"));

        registry.cancel_all();

        assert!(registry.is_empty());
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[test]
    fn parent_cancellation_reaches_new_contexts() {
        let parent = CancellationToken::new();
        let registry = PollerRegistry::with_parent(&parent);
        let before = registry.register(&id("a"));

        parent.cancel();
        let after = registry.register(&id("b"));

        assert!(before.is_cancelled());
        assert!(after.is_cancelled());
    }

    #[test]
    fn active_poller_releases_on_drop() {
        let registry = PollerRegistry::new();
        {
            let _active = registry.activate(&id("d1"));
            assert!(registry.is_active(&id("d1")));
        }
        assert!(registry.is_empty());
    }
}
