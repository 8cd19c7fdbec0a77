//! Non-blocking single-flight guard per job kind
//!
//! `try_acquire` either hands out the only permit or fails immediately;
//! it never waits. The permit releases the guard when dropped, so every
//! exit path of the job (success, error, panic) frees it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct JobGuard {
    busy: AtomicBool,
}

impl JobGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn try_acquire(self: &Arc<Self>) -> Option<JobPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| JobPermit {
                guard: Arc::clone(self),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the lifetime of one job execution
#[derive(Debug)]
pub struct JobPermit {
    guard: Arc<JobGuard>,
}

impl Drop for JobPermit {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
