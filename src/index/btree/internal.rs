//! B+Tree internal (routing) node.

use crate::common::config::{INTERNAL_ENTRY_SIZE, INTERNAL_MAX_KEYS, NODE_HEADER_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};
use crate::storage::DiskManager;

use super::{Key, Split};

/// An internal node: `k` sorted keys and `k + 1` child page ids.
///
/// Child `i` holds keys `>= keys[i - 1]` (when `i > 0`) and `< keys[i]`
/// (when `i < k`).
///
/// # Page Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       5     PageHeader (type = BTreeInternal, CRC32)
/// 5       2     key count
/// 8       4     leftmost child page id
/// 12      8*k   pairs: key (i32), child right of key (u32)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    keys: Vec<Key>,
    children: Vec<PageId>,
    capacity: usize,
}

impl InternalNode {
    const OFFSET_KEY_COUNT: usize = PageHeader::SIZE;
    const OFFSET_FIRST_CHILD: usize = 8;

    /// Build a two-child root after the node below it split.
    pub fn new_root(capacity: usize, key: Key, left: PageId, right: PageId) -> Self {
        let mut keys = Vec::with_capacity(capacity + 1);
        keys.push(key);
        let mut children = Vec::with_capacity(capacity + 2);
        children.extend([left, right]);

        Self {
            keys,
            children,
            capacity,
        }
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[inline]
    pub fn children(&self) -> &[PageId] {
        &self.children
    }

    /// Load the internal node stored at `pid`.
    ///
    /// # Errors
    /// - `Error::PageNotFound` / `Error::Io` if the page cannot be read
    /// - `Error::CorruptPage` if the page is not an intact internal node
    pub fn read(pid: PageId, disk: &mut DiskManager, capacity: usize) -> Result<Self> {
        let page = disk.read_page(pid)?;
        Self::from_page(pid, &page, capacity)
    }

    /// Store the node at `pid`.
    pub fn write(&self, pid: PageId, disk: &mut DiskManager) -> Result<()> {
        disk.write_page(pid, &self.to_page())
    }

    /// Decode an internal node from a page read from `pid`.
    pub fn from_page(pid: PageId, page: &Page, capacity: usize) -> Result<Self> {
        let corrupt = |reason: String| Error::CorruptPage { page: pid, reason };

        let header = page.header();
        if header.page_type != PageType::BTreeInternal {
            return Err(corrupt(format!(
                "expected internal page, found {:?}",
                header.page_type
            )));
        }
        if !page.verify_checksum() {
            return Err(corrupt("internal checksum mismatch".into()));
        }

        let count = page.get_u16(Self::OFFSET_KEY_COUNT) as usize;
        if count == 0 || count > INTERNAL_MAX_KEYS {
            return Err(corrupt(format!("internal key count {} out of range", count)));
        }

        let mut keys = Vec::with_capacity(count.max(capacity) + 1);
        let mut children = Vec::with_capacity(count.max(capacity) + 2);
        children.push(PageId::new(page.get_u32(Self::OFFSET_FIRST_CHILD)));
        for i in 0..count {
            let offset = NODE_HEADER_SIZE + i * INTERNAL_ENTRY_SIZE;
            keys.push(page.get_i32(offset));
            children.push(PageId::new(page.get_u32(offset + 4)));
        }

        if let Some(child) = children.iter().find(|c| **c == PageId::META || !c.is_valid()) {
            return Err(corrupt(format!("child pointer {} is not a node page", child)));
        }

        Ok(Self {
            keys,
            children,
            capacity,
        })
    }

    /// Encode the node into a fresh page, checksum included.
    pub fn to_page(&self) -> Page {
        let mut page = Page::new();
        page.set_header(&PageHeader::new(PageType::BTreeInternal));
        page.put_u16(Self::OFFSET_KEY_COUNT, self.keys.len() as u16);
        page.put_u32(Self::OFFSET_FIRST_CHILD, self.children[0].0);

        for (i, (&key, child)) in self.keys.iter().zip(&self.children[1..]).enumerate() {
            let offset = NODE_HEADER_SIZE + i * INTERNAL_ENTRY_SIZE;
            page.put_i32(offset, key);
            page.put_u32(offset + 4, child.0);
        }

        page.update_checksum();
        page
    }

    /// Insert `key` with `child` as the subtree immediately to its right.
    ///
    /// # Errors
    /// `Error::NodeFull` if the node is at capacity (node unchanged).
    pub fn insert(&mut self, key: Key, child: PageId) -> Result<()> {
        if self.keys.len() >= self.capacity {
            return Err(Error::NodeFull);
        }
        self.insert_unchecked(key, child);
        Ok(())
    }

    fn insert_unchecked(&mut self, key: Key, child: PageId) {
        let pos = self.keys.partition_point(|&k| k <= key);
        self.keys.insert(pos, key);
        self.children.insert(pos + 1, child);
    }

    /// Insert into a full node and split it.
    ///
    /// With `n` keys after the insert, the median `keys[n / 2]` moves up as
    /// the separator and appears in neither half. This node keeps the keys
    /// below it and their children; the sibling gets the keys above.
    pub fn insert_and_split(&mut self, key: Key, child: PageId) -> Split<InternalNode> {
        self.insert_unchecked(key, child);

        let mid = self.keys.len() / 2;
        let right_keys = self.keys.split_off(mid + 1);
        let separator = self.keys[mid];
        self.keys.truncate(mid);
        let right_children = self.children.split_off(mid + 1);

        let sibling = InternalNode {
            keys: right_keys,
            children: right_children,
            capacity: self.capacity,
        };

        Split { sibling, separator }
    }

    /// The child to descend into when searching for `key`.
    ///
    /// That is the child left of the first key strictly greater than `key`,
    /// or the last child when no key is greater.
    pub fn locate_child_ptr(&self, key: Key) -> PageId {
        let idx = self.keys.partition_point(|&k| k <= key);
        self.children[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u32) -> PageId {
        PageId::new(n)
    }

    /// Root over children 1..=k+1 separated by `keys`.
    fn node_with(capacity: usize, keys: &[Key]) -> InternalNode {
        let mut node = InternalNode::new_root(capacity, keys[0], pid(1), pid(2));
        for (i, &k) in keys.iter().enumerate().skip(1) {
            node.insert(k, pid(i as u32 + 2)).unwrap();
        }
        node
    }

    #[test]
    fn test_new_root() {
        let node = InternalNode::new_root(4, 40, pid(1), pid(2));
        assert_eq!(node.keys(), &[40]);
        assert_eq!(node.children(), &[pid(1), pid(2)]);
    }

    #[test]
    fn test_locate_child_ptr() {
        let node = node_with(4, &[10, 20, 30]);
        assert_eq!(node.children(), &[pid(1), pid(2), pid(3), pid(4)]);

        assert_eq!(node.locate_child_ptr(5), pid(1));
        assert_eq!(node.locate_child_ptr(10), pid(2));
        assert_eq!(node.locate_child_ptr(19), pid(2));
        assert_eq!(node.locate_child_ptr(20), pid(3));
        assert_eq!(node.locate_child_ptr(30), pid(4));
        assert_eq!(node.locate_child_ptr(i32::MAX), pid(4));
        assert_eq!(node.locate_child_ptr(i32::MIN), pid(1));
    }

    #[test]
    fn test_insert_places_child_right_of_key() {
        let mut node = InternalNode::new_root(4, 40, pid(1), pid(2));
        node.insert(20, pid(7)).unwrap();

        assert_eq!(node.keys(), &[20, 40]);
        assert_eq!(node.children(), &[pid(1), pid(7), pid(2)]);
        assert_eq!(node.locate_child_ptr(25), pid(7));
    }

    #[test]
    fn test_insert_full_node_fails() {
        let mut node = node_with(2, &[10, 20]);
        assert!(matches!(node.insert(30, pid(9)), Err(Error::NodeFull)));
        assert_eq!(node.key_count(), 2);
    }

    #[test]
    fn test_split_promotes_median() {
        let mut node = node_with(4, &[10, 20, 30, 40]);
        let split = node.insert_and_split(50, pid(6));

        assert_eq!(split.separator, 30);
        assert_eq!(node.keys(), &[10, 20]);
        assert_eq!(node.children(), &[pid(1), pid(2), pid(3)]);
        assert_eq!(split.sibling.keys(), &[40, 50]);
        assert_eq!(split.sibling.children(), &[pid(4), pid(5), pid(6)]);
    }

    #[test]
    fn test_split_odd_capacity_left_biased() {
        let mut node = node_with(3, &[10, 20, 30]);
        let split = node.insert_and_split(5, pid(9));

        // keys after insert: [5, 10, 20, 30]
        assert_eq!(split.separator, 20);
        assert_eq!(node.keys(), &[5, 10]);
        assert_eq!(node.children(), &[pid(1), pid(9), pid(2)]);
        assert_eq!(split.sibling.keys(), &[30]);
        assert_eq!(split.sibling.children(), &[pid(3), pid(4)]);
    }

    #[test]
    fn test_page_roundtrip() {
        let node = node_with(INTERNAL_MAX_KEYS, &[-100, 0, 100, 2000]);
        let decoded =
            InternalNode::from_page(pid(4), &node.to_page(), INTERNAL_MAX_KEYS).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn test_rejects_leaf_page() {
        let leaf = super::super::LeafNode::new(4);
        assert!(matches!(
            InternalNode::from_page(pid(1), &leaf.to_page(), 4),
            Err(Error::CorruptPage { .. })
        ));
    }

    #[test]
    fn test_rejects_null_child() {
        let node = InternalNode::new_root(4, 1, PageId::META, pid(2));
        assert!(matches!(
            InternalNode::from_page(pid(1), &node.to_page(), 4),
            Err(Error::CorruptPage { .. })
        ));
    }
}
