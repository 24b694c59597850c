use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Reentrancy guard for loaders driven by a [`crate::Refresher`].
///
/// A loader calls [`LoadingFlag::try_begin`] first; if another load is still
/// in flight it gets `None` and returns without issuing a request. The flag
/// is cleared when the returned guard drops, whichever way the load ended.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag {
    loading: Arc<AtomicBool>,
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a load as started, unless one is already running.
    #[must_use]
    pub fn try_begin(&self) -> Option<LoadingGuard> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard {
                loading: Arc::clone(&self.loading),
            })
    }

    /// Returns whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }
}

/// Clears its [`LoadingFlag`] on drop.
#[derive(Debug)]
pub struct LoadingGuard {
    loading: Arc<AtomicBool>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::Release);
    }
}
