//! A decorator that counts every allocation and release passing through a policy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::TextpackError;
use crate::memory::{MemoryPolicy, MemoryRegion, RawBlock};

/// A snapshot of the counters held by a `TrackingPolicy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationStats {
    pub allocations: usize,
    pub failed_allocations: usize,
    pub releases: usize,
    pub live_bytes: usize,
    pub peak_bytes: usize,
}

impl AllocationStats {
    /// True when every successful allocation has been released.
    pub fn is_balanced(&self) -> bool {
        self.allocations == self.releases && self.live_bytes == 0
    }
}

#[derive(Debug, Default)]
pub struct TrackingPolicy<P> {
    inner: P,
    allocations: AtomicUsize,
    failed_allocations: AtomicUsize,
    releases: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
}

impl<P: MemoryPolicy> TrackingPolicy<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            allocations: AtomicUsize::new(0),
            failed_allocations: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> AllocationStats {
        AllocationStats {
            allocations: self.allocations.load(Ordering::Acquire),
            failed_allocations: self.failed_allocations.load(Ordering::Acquire),
            releases: self.releases.load(Ordering::Acquire),
            live_bytes: self.live_bytes.load(Ordering::Acquire),
            peak_bytes: self.peak_bytes.load(Ordering::Acquire),
        }
    }
}

impl<P: MemoryPolicy> MemoryPolicy for TrackingPolicy<P> {
    fn region(&self) -> MemoryRegion {
        self.inner.region()
    }

    fn allocate_cells<T: Clone + Default>(
        &self,
        count: usize,
    ) -> Result<RawBlock<T>, TextpackError> {
        match self.inner.allocate_cells(count) {
            Ok(block) => {
                let size = block.byte_len();
                self.allocations.fetch_add(1, Ordering::AcqRel);
                let live = self.live_bytes.fetch_add(size, Ordering::AcqRel) + size;
                self.peak_bytes.fetch_max(live, Ordering::AcqRel);
                Ok(block)
            }
            Err(e) => {
                self.failed_allocations.fetch_add(1, Ordering::AcqRel);
                Err(e)
            }
        }
    }

    fn release<T>(&self, block: RawBlock<T>) {
        let size = block.byte_len();
        self.releases.fetch_add(1, Ordering::AcqRel);
        let _ = self
            .live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                Some(live.saturating_sub(size))
            });
        self.inner.release(block);
    }
}
