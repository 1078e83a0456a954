// In: src/memory/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Allocator Policy
// ====================================================================================
//
// Every buffer the compression transform writes into is a `WorkingBuffer`, obtained
// from a `MemoryPolicy` that the `Codec` receives at construction time.
//
//   [Codec] --acquire(size)--> [WorkingBuffer] --allocate--> [MemoryPolicy]
//      |                              |
//      `-- transform writes --------->|
//                                     `-- Drop --release--> [MemoryPolicy]
//
// The Brotli state behind the transform (hash tables, ring buffers, Huffman tables)
// is drawn from the same policy through a `PolicyAllocator`, so a policy's budget
// covers everything a call holds, not only its output buffer.
//
// The policy decides WHERE the memory comes from:
//
//   * `HeapPolicy`  - the default heap, optionally with a byte budget that models a
//                     small internal RAM.
//   * `CapsPolicy`  - capability-tagged external RAM (8-bit addressable, PSRAM
//                     backed), bounded by the size of that region.
//
// Which of the two a build uses is fixed at compile time by the `external-ram`
// cargo feature (`DefaultPolicy`). Both are always compiled so both can be exercised
// on a development host.
// ====================================================================================

mod brotli_alloc;
mod caps;
mod heap;
mod tracking;

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::TextpackError;

pub use brotli_alloc::{AllocationLatch, CodecCell, PolicyAllocator};
pub use caps::{CapsPolicy, DEFAULT_EXTERNAL_RAM_CAPACITY};
pub use heap::HeapPolicy;
pub use tracking::{AllocationStats, TrackingPolicy};

//==================================================================================
// 1. Build-Time Strategy Selection
//==================================================================================

/// The policy used when the caller does not inject one.
#[cfg(feature = "external-ram")]
pub type DefaultPolicy = CapsPolicy;

/// The policy used when the caller does not inject one.
#[cfg(not(feature = "external-ram"))]
pub type DefaultPolicy = HeapPolicy;

pub fn default_policy() -> DefaultPolicy {
    DefaultPolicy::default()
}

//==================================================================================
// 2. Core Types
//==================================================================================

/// The physical pool a block was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    InternalHeap,
    /// 8-bit addressable memory backed by external RAM.
    ExternalRam,
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryRegion::InternalHeap => f.write_str("internal heap"),
            MemoryRegion::ExternalRam => f.write_str("external RAM"),
        }
    }
}

/// A block of default-valued cells (zero bytes, for the codec's element types),
/// tagged with the region it came from.
///
/// Blocks are only ever created by a `MemoryPolicy` implementation in this crate and
/// handed back through `MemoryPolicy::release`.
#[derive(Debug)]
pub struct RawBlock<T = u8> {
    cells: Vec<T>,
    region: MemoryRegion,
}

impl<T: Clone + Default> RawBlock<T> {
    /// Allocates `count` default cells, reporting failure instead of aborting.
    pub(crate) fn zeroed(count: usize, region: MemoryRegion) -> Result<Self, TextpackError> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| TextpackError::Allocation {
                requested: count.saturating_mul(mem::size_of::<T>()),
                region,
            })?;
        cells.resize(count, T::default());
        Ok(Self { cells, region })
    }
}

impl<T> RawBlock<T> {
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Size of the block in bytes, the unit every budget is kept in.
    pub fn byte_len(&self) -> usize {
        self.cells.len() * mem::size_of::<T>()
    }

    pub fn region(&self) -> MemoryRegion {
        self.region
    }
}

/// Bytes needed for `count` cells of `T`, or an allocation error on overflow.
pub(crate) fn byte_size<T>(count: usize, region: MemoryRegion) -> Result<usize, TextpackError> {
    count
        .checked_mul(mem::size_of::<T>())
        .ok_or(TextpackError::Allocation {
            requested: usize::MAX,
            region,
        })
}

/// The capability interface through which the pipeline, and the codec inside it,
/// obtains working memory.
pub trait MemoryPolicy: Send + Sync {
    /// The region this policy draws from.
    fn region(&self) -> MemoryRegion;

    /// Returns `count` default-valued cells of `T`, charged at their size in bytes.
    fn allocate_cells<T: Clone + Default>(
        &self,
        count: usize,
    ) -> Result<RawBlock<T>, TextpackError>;

    /// Returns a block previously obtained from this policy.
    fn release<T>(&self, block: RawBlock<T>);

    /// Returns a zero-filled block of exactly `size` bytes.
    fn allocate(&self, size: usize) -> Result<RawBlock, TextpackError> {
        self.allocate_cells(size)
    }
}

//==================================================================================
// 3. The Working Buffer
//==================================================================================

/// A transient buffer scoped to a single transform call.
///
/// The block goes back to its policy exactly once, when the buffer is dropped.
pub struct WorkingBuffer<'p, P: MemoryPolicy, T = u8> {
    block: Option<RawBlock<T>>,
    policy: &'p P,
}

impl<'p, P: MemoryPolicy> WorkingBuffer<'p, P> {
    /// A byte buffer of `size` zeroes.
    pub fn acquire(policy: &'p P, size: usize) -> Result<Self, TextpackError> {
        Self::acquire_cells(policy, size)
    }
}

impl<'p, P: MemoryPolicy, T: Clone + Default> WorkingBuffer<'p, P, T> {
    pub fn acquire_cells(policy: &'p P, count: usize) -> Result<Self, TextpackError> {
        let block = policy.allocate_cells(count)?;
        Ok(Self {
            block: Some(block),
            policy,
        })
    }
}

impl<P: MemoryPolicy, T> WorkingBuffer<'_, P, T> {
    pub fn region(&self) -> Option<MemoryRegion> {
        self.block.as_ref().map(RawBlock::region)
    }
}

impl<P: MemoryPolicy, T> Deref for WorkingBuffer<'_, P, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match &self.block {
            Some(block) => &block.cells,
            None => &[],
        }
    }
}

impl<P: MemoryPolicy, T> DerefMut for WorkingBuffer<'_, P, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match &mut self.block {
            Some(block) => &mut block.cells,
            None => &mut [],
        }
    }
}

impl<P: MemoryPolicy, T> Drop for WorkingBuffer<'_, P, T> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.policy.release(block);
        }
    }
}

//==================================================================================
// 4. Shared Budget Accounting
//==================================================================================

/// Byte accounting for a bounded (or unbounded) pool.
#[derive(Debug)]
pub(crate) struct Budget {
    limit: Option<usize>,
    in_use: AtomicUsize,
}

impl Budget {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            in_use: AtomicUsize::new(0),
        }
    }

    /// Claims `size` bytes; `false` if the pool cannot cover them.
    pub(crate) fn reserve(&self, size: usize) -> bool {
        let limit = self.limit;
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.checked_add(size)?;
                match limit {
                    Some(limit) if next > limit => None,
                    _ => Some(next),
                }
            })
            .is_ok()
    }

    pub(crate) fn credit(&self, size: usize) {
        let _ = self
            .in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(size))
            });
    }

    pub(crate) fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    pub(crate) fn limit(&self) -> Option<usize> {
        self.limit
    }
}
