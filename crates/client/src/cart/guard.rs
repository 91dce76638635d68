//! Loading flag bookkeeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

use super::CartSnapshot;

/// Counts operations in progress and keeps `CartSnapshot::is_loading` true
/// while at least one is alive. Dropping the guard (on any path, including
/// early returns and panics) releases it.
pub(super) struct LoadingGuard {
    in_flight: Arc<AtomicUsize>,
    state: Arc<watch::Sender<CartSnapshot>>,
}

impl LoadingGuard {
    pub(super) fn acquire(
        in_flight: &Arc<AtomicUsize>,
        state: &Arc<watch::Sender<CartSnapshot>>,
    ) -> Self {
        let guard = Self {
            in_flight: Arc::clone(in_flight),
            state: Arc::clone(state),
        };
        if guard.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            guard.publish();
        }
        guard
    }

    /// Publish the flag from the current count. The count is read under the
    /// channel's write lock so racing acquire/release calls settle on the
    /// right value.
    fn publish(&self) {
        self.state.send_if_modified(|snapshot| {
            let loading = self.in_flight.load(Ordering::SeqCst) > 0;
            std::mem::replace(&mut snapshot.is_loading, loading) != loading
        });
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.publish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_guards_keep_loading_until_last_drop() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(CartSnapshot::default());
        let state = Arc::new(tx);

        let first = LoadingGuard::acquire(&in_flight, &state);
        let second = LoadingGuard::acquire(&in_flight, &state);
        assert!(rx.borrow().is_loading);

        drop(first);
        assert!(rx.borrow().is_loading);

        drop(second);
        assert!(!rx.borrow().is_loading);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }
}
