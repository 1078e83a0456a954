//! Working memory drawn from capability-tagged external RAM.
//!
//! On boards with PSRAM the internal RAM is small and fragmented, so working
//! buffers are placed in the external, 8-bit addressable region instead. When that
//! region is exhausted the allocation fails; it never spills into internal RAM.

use crate::error::TextpackError;
use crate::memory::{byte_size, Budget, MemoryPolicy, MemoryRegion, RawBlock};

/// Usable external RAM on a typical 4 MiB PSRAM module.
pub const DEFAULT_EXTERNAL_RAM_CAPACITY: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub struct CapsPolicy {
    budget: Budget,
}

impl CapsPolicy {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            budget: Budget::new(Some(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.budget.limit().unwrap_or(DEFAULT_EXTERNAL_RAM_CAPACITY)
    }

    pub fn bytes_in_use(&self) -> usize {
        self.budget.in_use()
    }
}

impl Default for CapsPolicy {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EXTERNAL_RAM_CAPACITY)
    }
}

impl MemoryPolicy for CapsPolicy {
    fn region(&self) -> MemoryRegion {
        MemoryRegion::ExternalRam
    }

    fn allocate_cells<T: Clone + Default>(
        &self,
        count: usize,
    ) -> Result<RawBlock<T>, TextpackError> {
        let size = byte_size::<T>(count, MemoryRegion::ExternalRam)?;
        if !self.budget.reserve(size) {
            log_metric!("event"="caps_alloc", "outcome"="exhausted", "requested"=&size);
            return Err(TextpackError::Allocation {
                requested: size,
                region: MemoryRegion::ExternalRam,
            });
        }
        RawBlock::zeroed(count, MemoryRegion::ExternalRam).inspect_err(|_| {
            self.budget.credit(size);
        })
    }

    fn release<T>(&self, block: RawBlock<T>) {
        if block.region() != MemoryRegion::ExternalRam {
            log::error!(
                "external RAM policy asked to release a {} byte block from {}",
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
    fn test_blocks_are_tagged_external() {
        let policy = CapsPolicy::default();
        let block = policy.allocate(16_384).unwrap();
        assert_eq!(block.region(), MemoryRegion::ExternalRam);
        assert_eq!(policy.capacity(), DEFAULT_EXTERNAL_RAM_CAPACITY);
        policy.release(block);
        assert_eq!(policy.bytes_in_use(), 0);
    }

    #[test]
    fn test_exhausted_region_does_not_fall_back() {
        let policy = CapsPolicy::with_capacity(1000);
        let first = policy.allocate(800).unwrap();

        let err = policy.allocate(300).unwrap_err();
        assert!(matches!(
            err,
            TextpackError::Allocation {
                requested: 300,
                region: MemoryRegion::ExternalRam
            }
        ));

        policy.release(first);
        assert_eq!(policy.allocate(1000).unwrap().len(), 1000);
    }
}
