//! Working memory drawn from the default heap.
//!
//! This is the policy for boards without external RAM. An optional byte limit lets
//! a host build model the small internal RAM of the target.

use crate::error::TextpackError;
use crate::memory::{byte_size, Budget, MemoryPolicy, MemoryRegion, RawBlock};

#[derive(Debug)]
pub struct HeapPolicy {
    budget: Budget,
}

impl HeapPolicy {
    /// A heap policy that refuses to hold more than `limit` bytes at once.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            budget: Budget::new(Some(limit)),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.budget.limit()
    }

    pub fn bytes_in_use(&self) -> usize {
        self.budget.in_use()
    }
}

impl Default for HeapPolicy {
    fn default() -> Self {
        Self {
            budget: Budget::new(None),
        }
    }
}

impl MemoryPolicy for HeapPolicy {
    fn region(&self) -> MemoryRegion {
        MemoryRegion::InternalHeap
    }

    fn allocate_cells<T: Clone + Default>(
        &self,
        count: usize,
    ) -> Result<RawBlock<T>, TextpackError> {
        let size = byte_size::<T>(count, MemoryRegion::InternalHeap)?;
        if !self.budget.reserve(size) {
            return Err(TextpackError::Allocation {
                requested: size,
                region: MemoryRegion::InternalHeap,
            });
        }
        RawBlock::zeroed(count, MemoryRegion::InternalHeap).inspect_err(|_| {
            self.budget.credit(size);
        })
    }

    fn release<T>(&self, block: RawBlock<T>) {
        if block.region() != MemoryRegion::InternalHeap {
            log::error!(
                "heap policy asked to release a {} byte block from {}",
                block.byte_len(),
                block.region()
            );
            return;
        }
        self.budget.credit(block.byte_len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_heap_allocates_zeroed_blocks() {
        let policy = HeapPolicy::default();
        let block = policy.allocate(1024).unwrap();
        assert_eq!(block.len(), 1024);
        assert_eq!(block.region(), MemoryRegion::InternalHeap);
        assert_eq!(policy.bytes_in_use(), 1024);
        policy.release(block);
        assert_eq!(policy.bytes_in_use(), 0);
    }

    #[test]
    fn test_limited_heap_reports_allocation_error() {
        let policy = HeapPolicy::with_limit(512);
        let held = policy.allocate(400).unwrap();

        let result = policy.allocate(200);
        match result {
            Err(TextpackError::Allocation { requested, region }) => {
                assert_eq!(requested, 200);
                assert_eq!(region, MemoryRegion::InternalHeap);
            }
            other => panic!("expected allocation failure, got {:?}", other),
        }

        policy.release(held);
        assert!(policy.allocate(200).is_ok());
    }

    #[test]
    fn test_typed_cells_are_charged_in_bytes() {
        let policy = HeapPolicy::with_limit(4096);
        let words = policy.allocate_cells::<u32>(1000).unwrap();
        assert_eq!(words.len(), 1000);
        assert_eq!(words.byte_len(), 4000);
        assert_eq!(policy.bytes_in_use(), 4000);

        assert!(policy.allocate_cells::<u64>(100).is_err());

        policy.release(words);
        assert_eq!(policy.bytes_in_use(), 0);
    }

    #[test]
    fn test_foreign_block_is_not_credited() {
        let policy = HeapPolicy::with_limit(100);
        let _held = policy.allocate(100).unwrap();
        let foreign = RawBlock::<u8>::zeroed(50, MemoryRegion::ExternalRam).unwrap();

        policy.release(foreign);

        assert_eq!(policy.bytes_in_use(), 100);
    }
}
