//! B+Tree leaf node.

use crate::common::config::{LEAF_ENTRY_SIZE, LEAF_MAX_KEYS, NODE_HEADER_SIZE};
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::page::{Page, PageHeader, PageType};
use crate::storage::DiskManager;

use super::{Key, Split};

/// A leaf node: sorted `(key, record id)` entries plus a pointer to the
/// next leaf in key order.
///
/// # Page Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       5     PageHeader (type = BTreeLeaf, CRC32)
/// 5       2     key count
/// 8       4     next leaf page id (0 = none)
/// 12      12*n  entries: key (i32), record pid (u32), record sid (u32)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    entries: Vec<(Key, RecordId)>,
    next: Option<PageId>,
    capacity: usize,
}

impl LeafNode {
    const OFFSET_KEY_COUNT: usize = PageHeader::SIZE;
    const OFFSET_NEXT: usize = 8;

    /// Create an empty leaf that holds at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity + 1),
            next: None,
            capacity,
        }
    }

    /// Number of entries currently stored.
    #[inline]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Smallest key in the node.
    pub fn first_key(&self) -> Option<Key> {
        self.entries.first().map(|&(key, _)| key)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.entries.iter().map(|&(key, _)| key)
    }

    /// Load the leaf stored at `pid`.
    ///
    /// # Errors
    /// - `Error::PageNotFound` / `Error::Io` if the page cannot be read
    /// - `Error::CorruptPage` if the page is not an intact leaf
    pub fn read(pid: PageId, disk: &mut DiskManager, capacity: usize) -> Result<Self> {
        let page = disk.read_page(pid)?;
        Self::from_page(pid, &page, capacity)
    }

    /// Store the leaf at `pid`.
    pub fn write(&self, pid: PageId, disk: &mut DiskManager) -> Result<()> {
        disk.write_page(pid, &self.to_page())
    }

    /// Decode a leaf from a page read from `pid`.
    pub fn from_page(pid: PageId, page: &Page, capacity: usize) -> Result<Self> {
        let header = page.header();
        if header.page_type != PageType::BTreeLeaf {
            return Err(Error::CorruptPage {
                page: pid,
                reason: format!("expected leaf page, found {:?}", header.page_type),
            });
        }
        if !page.verify_checksum() {
            return Err(Error::CorruptPage {
                page: pid,
                reason: "leaf checksum mismatch".into(),
            });
        }

        let count = page.get_u16(Self::OFFSET_KEY_COUNT) as usize;
        if count > LEAF_MAX_KEYS {
            return Err(Error::CorruptPage {
                page: pid,
                reason: format!("leaf key count {} exceeds {}", count, LEAF_MAX_KEYS),
            });
        }

        let entries = (0..count)
            .map(|i| {
                let offset = NODE_HEADER_SIZE + i * LEAF_ENTRY_SIZE;
                let key = page.get_i32(offset);
                let rid = RecordId::new(
                    PageId::new(page.get_u32(offset + 4)),
                    page.get_u32(offset + 8),
                );
                (key, rid)
            })
            .collect();

        Ok(Self {
            entries,
            next: PageId::from_link(page.get_u32(Self::OFFSET_NEXT)),
            capacity,
        })
    }

    /// Encode the leaf into a fresh page, checksum included.
    pub fn to_page(&self) -> Page {
        let mut page = Page::new();
        page.set_header(&PageHeader::new(PageType::BTreeLeaf));
        page.put_u16(Self::OFFSET_KEY_COUNT, self.entries.len() as u16);
        page.put_u32(Self::OFFSET_NEXT, PageId::to_link(self.next));

        for (i, &(key, rid)) in self.entries.iter().enumerate() {
            let offset = NODE_HEADER_SIZE + i * LEAF_ENTRY_SIZE;
            page.put_i32(offset, key);
            page.put_u32(offset + 4, rid.pid.0);
            page.put_u32(offset + 8, rid.sid);
        }

        page.update_checksum();
        page
    }

    /// Insert an entry in key order.
    ///
    /// An equal key goes after the existing ones.
    ///
    /// # Errors
    /// `Error::NodeFull` if the leaf is at capacity; the node is unchanged
    /// and the caller should use [`insert_and_split`](Self::insert_and_split).
    pub fn insert(&mut self, key: Key, rid: RecordId) -> Result<()> {
        if self.entries.len() >= self.capacity {
            return Err(Error::NodeFull);
        }
        let pos = self.entries.partition_point(|&(k, _)| k <= key);
        self.entries.insert(pos, (key, rid));
        Ok(())
    }

    /// Insert an entry into a full leaf and split it in two.
    ///
    /// With `n` entries after the insert, this node keeps the lower
    /// `ceil(n / 2)` and the returned sibling gets the rest. The sibling
    /// inherits this node's next pointer; once the sibling has a page id
    /// the caller must point this node at it with
    /// [`set_next_node_ptr`](Self::set_next_node_ptr).
    ///
    /// The separator is the sibling's first key: keys `>=` it route right.
    ///
    /// # Panics
    /// If the leaf is not at capacity; use [`insert`](Self::insert) until
    /// it reports `Error::NodeFull`.
    pub fn insert_and_split(&mut self, key: Key, rid: RecordId) -> Split<LeafNode> {
        assert!(
            self.entries.len() >= self.capacity,
            "split of a leaf with {} of {} entries",
            self.entries.len(),
            self.capacity
        );
        let pos = self.entries.partition_point(|&(k, _)| k <= key);
        self.entries.insert(pos, (key, rid));

        let keep = self.entries.len().div_ceil(2);
        let moved = self.entries.split_off(keep);
        let separator = moved[0].0;

        let sibling = LeafNode {
            entries: moved,
            next: self.next,
            capacity: self.capacity,
        };

        Split { sibling, separator }
    }

    /// Find the entry holding `key`.
    ///
    /// Returns `Ok(eid)` if present, otherwise `Err(eid)` with the
    /// insertion point: the first entry whose key is `>= key` (may equal
    /// [`key_count`](Self::key_count)).
    pub fn locate(&self, key: Key) -> std::result::Result<usize, usize> {
        let eid = self.entries.partition_point(|&(k, _)| k < key);
        match self.entries.get(eid) {
            Some(&(k, _)) if k == key => Ok(eid),
            _ => Err(eid),
        }
    }

    /// Read the entry at `eid`.
    ///
    /// # Errors
    /// `Error::InvalidIndex` if `eid` is out of bounds.
    pub fn read_entry(&self, eid: usize) -> Result<(Key, RecordId)> {
        self.entries
            .get(eid)
            .copied()
            .ok_or(Error::InvalidIndex {
                eid,
                count: self.entries.len(),
            })
    }

    /// Next leaf in key order, if any.
    #[inline]
    pub fn next_node_ptr(&self) -> Option<PageId> {
        self.next
    }

    #[inline]
    pub fn set_next_node_ptr(&mut self, next: Option<PageId>) {
        self.next = next;
    }
}
