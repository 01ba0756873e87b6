//! Configuration constants and runtime knobs for leafdb.

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// This value is chosen to match:
/// - OS page size on most systems (4096 bytes)
/// - Common database page sizes (PostgreSQL uses 8KB, but 4KB is also standard)
///
/// # Memory Layout
/// With 4KB pages and 32-bit PageIds:
/// - Max pages: 2^32 - 1 (u32::MAX is reserved as the "no page" sentinel)
/// - Max file size: just under 16TB
pub const PAGE_SIZE: usize = 4096;

/// Bytes reserved at the start of every B+Tree node page.
///
/// Page header (type + checksum), key count, and one pointer slot
/// (next leaf for leaves, leftmost child for internal nodes).
pub const NODE_HEADER_SIZE: usize = 12;

/// Size of one leaf entry: key (4) + record page id (4) + record slot (4).
pub const LEAF_ENTRY_SIZE: usize = 12;

/// Size of one internal entry: key (4) + right child page id (4).
pub const INTERNAL_ENTRY_SIZE: usize = 8;

/// Maximum number of entries a leaf page can physically hold.
pub const LEAF_MAX_KEYS: usize = (PAGE_SIZE - NODE_HEADER_SIZE) / LEAF_ENTRY_SIZE;

/// Maximum number of keys an internal page can physically hold.
pub const INTERNAL_MAX_KEYS: usize = (PAGE_SIZE - NODE_HEADER_SIZE) / INTERNAL_ENTRY_SIZE;

/// Fixed width of the value column in a record file, NUL padded.
pub const RECORD_VALUE_SIZE: usize = 100;

/// Size of one record: key (4) + value.
pub const RECORD_SIZE: usize = 4 + RECORD_VALUE_SIZE;

/// Bytes at the start of a record page holding its record count.
pub const RECORD_PAGE_HEADER_SIZE: usize = 4;

/// Number of records stored in one record page.
pub const RECORDS_PER_PAGE: usize = (PAGE_SIZE - RECORD_PAGE_HEADER_SIZE) / RECORD_SIZE;

/// Node capacities for a B+Tree index.
///
/// The defaults fill a page. Smaller capacities are useful for exercising
/// splits with a handful of keys; the on-disk format is the same either way,
/// so an index must be reopened with the capacities it was built with for
/// node occupancy to stay within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeConfig {
    /// Maximum entries per leaf node.
    pub leaf_capacity: usize,
    /// Maximum keys per internal node.
    pub internal_capacity: usize,
}

impl BTreeConfig {
    /// Create a config with explicit capacities.
    pub fn new(leaf_capacity: usize, internal_capacity: usize) -> Self {
        Self {
            leaf_capacity,
            internal_capacity,
        }
    }

    /// Check that both capacities can split and still fit in a page.
    pub fn validate(&self) -> Result<()> {
        if !(2..=LEAF_MAX_KEYS).contains(&self.leaf_capacity) {
            return Err(Error::InvalidConfig(format!(
                "leaf capacity {} outside 2..={}",
                self.leaf_capacity, LEAF_MAX_KEYS
            )));
        }
        if !(2..=INTERNAL_MAX_KEYS).contains(&self.internal_capacity) {
            return Err(Error::InvalidConfig(format!(
                "internal capacity {} outside 2..={}",
                self.internal_capacity, INTERNAL_MAX_KEYS
            )));
        }
        Ok(())
    }
}

impl Default for BTreeConfig {
    fn default() -> Self {
        Self::new(LEAF_MAX_KEYS, INTERNAL_MAX_KEYS)
    }
}
