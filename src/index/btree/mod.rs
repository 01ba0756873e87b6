//! B+Tree index over `i32` keys.
//!
//! # Structure
//! ```text
//!                  page 0: IndexMeta { root, height }
//!                               │
//!                        ┌──────▼──────┐
//!                        │ Internal 40 │            height 2
//!                        └──┬───────┬──┘
//!                 ┌─────────▼┐     ┌▼────────┐
//!                 │ 10 20 30 │────▶│ 40 50   │────▶ (none)
//!                 └──────────┘     └─────────┘
//! ```
//! - [`LeafNode`] - sorted `(key, RecordId)` entries and the next-leaf link
//! - [`InternalNode`] - routing keys and child page ids
//! - [`BTreeIndex`] - descent, insertion with split propagation, cursors
//! - [`Cursor`] / [`IndexScan`] - forward iteration along the leaf chain
//!
//! Every node occupies exactly one page; see each node type for its layout.

mod cursor;
mod index;
mod internal;
mod leaf;
mod meta;
mod validate;

pub use cursor::{Cursor, IndexScan, Lookup};
pub use index::BTreeIndex;
pub use internal::InternalNode;
pub use leaf::LeafNode;
pub use meta::IndexMeta;
pub use validate::TreeStats;

pub use crate::storage::OpenMode;

/// Index key type.
pub type Key = i32;

/// Result of splitting an overflowing node.
#[derive(Debug)]
pub struct Split<N> {
    /// New right-hand node; not yet written anywhere.
    pub sibling: N,
    /// Key to insert into the parent alongside the sibling's page id.
    pub separator: Key,
}
