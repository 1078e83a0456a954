//! Routes the Brotli codec's own working memory through a `MemoryPolicy`.
//!
//! The `brotli` crate asks for typed cells (bytes, words, Huffman codes, histograms)
//! through its `Allocator<T>` trait. `PolicyAllocator` answers every such request
//! from the injected policy, so hash tables and ring buffers land in the same region,
//! and count against the same budget, as the pipeline's working buffers.
//!
//! `Allocator::alloc_cell` cannot fail. A request the policy refuses is recorded in
//! the call's `AllocationLatch` and served from an untracked overdraft so the codec
//! can run to the end of its current step; the caller then checks the latch and
//! reports `TextpackError::Allocation` instead of the codec's result.

use std::cell::Cell;
use std::mem;

use ::brotli::enc::BrotliAlloc;
use ::brotli::{Allocator, SliceWrapper, SliceWrapperMut};

use crate::error::TextpackError;
use crate::memory::{MemoryPolicy, MemoryRegion, WorkingBuffer};

//==================================================================================
// 1. Refusal Latch
//==================================================================================

/// Remembers the first allocation a policy refused during one codec call.
#[derive(Debug, Default)]
pub struct AllocationLatch {
    refused: Cell<Option<usize>>,
}

impl AllocationLatch {
    fn record(&self, requested: usize) {
        if self.refused.get().is_none() {
            self.refused.set(Some(requested));
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.refused.get().is_some()
    }

    /// `Err` carrying the first refused request, if there was one.
    pub fn check(&self, region: MemoryRegion) -> Result<(), TextpackError> {
        match self.refused.get() {
            Some(requested) => Err(TextpackError::Allocation { requested, region }),
            None => Ok(()),
        }
    }
}

//==================================================================================
// 2. Cells
//==================================================================================

/// One allocation handed to the codec.
pub enum CodecCell<'p, P: MemoryPolicy, T> {
    Empty,
    /// Drawn from the policy; released when dropped.
    Leased(WorkingBuffer<'p, P, T>),
    /// Served after the policy refused; never charged, never released.
    Overdraft(Vec<T>),
}

impl<P: MemoryPolicy, T> Default for CodecCell<'_, P, T> {
    fn default() -> Self {
        CodecCell::Empty
    }
}

impl<P: MemoryPolicy, T> SliceWrapper<T> for CodecCell<'_, P, T> {
    fn slice(&self) -> &[T] {
        match self {
            CodecCell::Empty => &[],
            CodecCell::Leased(buffer) => &**buffer,
            CodecCell::Overdraft(cells) => cells.as_slice(),
        }
    }
}

impl<P: MemoryPolicy, T> SliceWrapperMut<T> for CodecCell<'_, P, T> {
    fn slice_mut(&mut self) -> &mut [T] {
        match self {
            CodecCell::Empty => &mut [],
            CodecCell::Leased(buffer) => &mut **buffer,
            CodecCell::Overdraft(cells) => cells.as_mut_slice(),
        }
    }
}

//==================================================================================
// 3. The Allocator
//==================================================================================

/// A `brotli` allocator backed by a `MemoryPolicy`.
pub struct PolicyAllocator<'p, P: MemoryPolicy> {
    policy: &'p P,
    latch: &'p AllocationLatch,
}

impl<'p, P: MemoryPolicy> PolicyAllocator<'p, P> {
    pub fn new(policy: &'p P, latch: &'p AllocationLatch) -> Self {
        Self { policy, latch }
    }
}

impl<P: MemoryPolicy> Clone for PolicyAllocator<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: MemoryPolicy> Copy for PolicyAllocator<'_, P> {}

impl<'p, P: MemoryPolicy, T: Clone + Default> Allocator<T> for PolicyAllocator<'p, P> {
    type AllocatedMemory = CodecCell<'p, P, T>;

    fn alloc_cell(&mut self, len: usize) -> CodecCell<'p, P, T> {
        if len == 0 {
            return CodecCell::Empty;
        }
        match WorkingBuffer::acquire_cells(self.policy, len) {
            Ok(buffer) => CodecCell::Leased(buffer),
            Err(_) => {
                let requested = len.saturating_mul(mem::size_of::<T>());
                log_metric!("event"="codec_alloc", "outcome"="refused", "requested"=&requested);
                self.latch.record(requested);
                CodecCell::Overdraft(overdraft(len))
            }
        }
    }

    fn free_cell(&mut self, cell: CodecCell<'p, P, T>) {
        drop(cell);
    }
}

impl<P: MemoryPolicy> BrotliAlloc for PolicyAllocator<'_, P> {}

fn overdraft<T: Clone + Default>(len: usize) -> Vec<T> {
    let mut cells = Vec::new();
    if cells.try_reserve_exact(len).is_ok() {
        cells.resize(len, T::default());
    }
    cells
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{HeapPolicy, TrackingPolicy};

    #[test]
    fn test_cells_are_charged_and_released() {
        let policy = TrackingPolicy::new(HeapPolicy::default());
        let latch = AllocationLatch::default();
        let mut alloc = PolicyAllocator::new(&policy, &latch);

        let mut words = Allocator::<u32>::alloc_cell(&mut alloc, 100);
        assert_eq!(words.slice().len(), 100);
        assert!(words.slice().iter().all(|&w| w == 0));
        words.slice_mut()[99] = 7;
        assert_eq!(policy.stats().live_bytes, 400);

        Allocator::<u32>::free_cell(&mut alloc, words);
        assert!(policy.stats().is_balanced());
        assert!(latch.check(policy.region()).is_ok());
    }

    #[test]
    fn test_zero_length_cells_skip_the_policy() {
        let policy = TrackingPolicy::new(HeapPolicy::default());
        let latch = AllocationLatch::default();
        let mut alloc = PolicyAllocator::new(&policy, &latch);

        let cell = Allocator::<u16>::alloc_cell(&mut alloc, 0);
        assert!(cell.slice().is_empty());
        assert_eq!(policy.stats().allocations, 0);
    }

    #[test]
    fn test_refused_cell_trips_latch_and_is_not_credited() {
        let policy = TrackingPolicy::new(HeapPolicy::with_limit(64));
        let latch = AllocationLatch::default();
        let mut alloc = PolicyAllocator::new(&policy, &latch);

        let cell = Allocator::<u8>::alloc_cell(&mut alloc, 100);
        assert_eq!(cell.slice().len(), 100);
        assert!(latch.is_tripped());

        Allocator::<u8>::free_cell(&mut alloc, cell);
        assert_eq!(policy.inner().bytes_in_use(), 0);
        assert_eq!(policy.stats().failed_allocations, 1);

        match latch.check(policy.region()) {
            Err(TextpackError::Allocation { requested, region }) => {
                assert_eq!(requested, 100);
                assert_eq!(region, MemoryRegion::InternalHeap);
            }
            other => panic!("expected allocation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_dropped_cell_still_returns_to_policy() {
        let policy = TrackingPolicy::new(HeapPolicy::default());
        let latch = AllocationLatch::default();
        let mut alloc = PolicyAllocator::new(&policy, &latch);

        {
            let _cell = Allocator::<u64>::alloc_cell(&mut alloc, 8);
            assert_eq!(policy.stats().live_bytes, 64);
        }
        assert!(policy.stats().is_balanced());
    }
}
