use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// At most one analysis cycle in flight. A tick that cannot take the permit
/// is skipped rather than queued.
#[derive(Debug, Clone)]
pub struct SingleFlight(Arc<Semaphore>);

/// Held for the whole life of a cycle; dropping it frees the guard.
#[derive(Debug)]
pub struct CyclePermit(#[allow(dead_code)] OwnedSemaphorePermit);

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleFlight {
    pub fn new() -> Self {
        Self(Arc::new(Semaphore::new(1)))
    }

    pub fn try_begin(&self) -> Option<CyclePermit> {
        self.0.clone().try_acquire_owned().ok().map(CyclePermit)
    }
}
