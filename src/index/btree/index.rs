//! BTreeIndex - a B+Tree over an index page file.
//!
//! The index owns its [`DiskManager`] for the whole session. Nodes are
//! decoded from a page, modified in memory, and written back whole; nothing
//! is cached between calls.

use std::path::Path;

use log::{debug, error, warn};

use crate::common::config::BTreeConfig;
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::{DiskManager, OpenMode};

use super::{Cursor, IndexMeta, IndexScan, InternalNode, Key, LeafNode, Lookup};

/// A disk-resident B+Tree mapping `i32` keys to [`RecordId`]s.
///
/// # Lifecycle
/// ```text
///   open(path, mode) ──▶ insert / locate / read_forward ... ──▶ close()
/// ```
/// Root page and height live in memory while open and are written to page
/// 0 by [`close`](Self::close). Dropping a modified write-mode index without
/// closing it logs a warning and flushes the metadata anyway.
///
/// # Example
/// ```no_run
/// use leafdb::index::btree::{BTreeIndex, Lookup, OpenMode};
/// use leafdb::{PageId, RecordId};
///
/// let mut index = BTreeIndex::open("movies.idx", OpenMode::Write)?;
/// index.insert(42, RecordId::new(PageId::new(0), 3))?;
///
/// if let Lookup::Found(mut cursor) = index.locate(42)? {
///     let (key, rid) = index.read_forward(&mut cursor)?;
///     assert_eq!((key, rid.sid), (42, 3));
/// }
/// index.close()?;
/// # Ok::<(), leafdb::Error>(())
/// ```
pub struct BTreeIndex {
    disk: DiskManager,
    meta: IndexMeta,
    config: BTreeConfig,
    mode: OpenMode,
    /// Root or height changed since page 0 was last written.
    meta_dirty: bool,
}

impl BTreeIndex {
    /// Open an index file with page-sized nodes.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::open_with_config(path, mode, BTreeConfig::default())
    }

    /// Open an index file with explicit node capacities.
    ///
    /// In write mode a missing (or zero-length) file is initialised with an
    /// empty-tree metadata page. Metadata that does not describe a usable
    /// tree is treated as an empty tree.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        config: BTreeConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut disk = DiskManager::open_with_mode(&path, mode)?;

        let meta = if disk.page_count() == 0 {
            if mode == OpenMode::Write {
                disk.append_page(&IndexMeta::EMPTY.to_page())?;
            }
            IndexMeta::EMPTY
        } else {
            Self::load_meta(&mut disk)?
        };

        debug!(
            "opened index {} ({:?}, root {}, height {})",
            path.as_ref().display(),
            mode,
            meta.root,
            meta.height
        );

        Ok(Self {
            disk,
            meta,
            config,
            mode,
            meta_dirty: false,
        })
    }

    fn load_meta(disk: &mut DiskManager) -> Result<IndexMeta> {
        let page = disk.read_page(PageId::META)?;
        let Some(meta) = IndexMeta::from_page(&page) else {
            return Ok(IndexMeta::EMPTY);
        };

        let pages = disk.page_count();
        if meta.height == 0 || meta.root.0 >= pages || meta.height >= pages {
            warn!(
                "ignoring index metadata (root {}, height {}) for a file of {} pages",
                meta.root, meta.height, pages
            );
            return Ok(IndexMeta::EMPTY);
        }
        Ok(meta)
    }

    /// Write metadata to page 0 and close the file.
    ///
    /// Both steps are attempted; the first failure is returned.
    pub fn close(mut self) -> Result<()> {
        let saved = match self.mode {
            OpenMode::Write => self.save_meta(),
            OpenMode::Read => Ok(()),
        };
        if let Err(e) = &saved {
            error!("failed to write index metadata: {}", e);
        }

        let synced = self.disk.sync();
        if let Err(e) = &synced {
            error!("failed to close index file: {}", e);
        }

        debug!(
            "closed index (root {}, height {})",
            self.meta.root, self.meta.height
        );
        saved.and(synced)
    }

    fn save_meta(&mut self) -> Result<()> {
        self.disk.write_page(PageId::META, &self.meta.to_page())?;
        self.meta_dirty = false;
        Ok(())
    }

    /// Root page id, or `PageId::INVALID` for an empty tree.
    #[inline]
    pub fn root(&self) -> PageId {
        self.meta.root
    }

    /// Number of levels; 0 for an empty tree, 1 when the root is a leaf.
    #[inline]
    pub fn height(&self) -> u32 {
        self.meta.height
    }

    #[inline]
    pub fn config(&self) -> BTreeConfig {
        self.config
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert a `(key, rid)` pair.
    ///
    /// Full nodes are split and separators pushed up the descent path; a
    /// split of the root adds a new root above it, which is the only way
    /// the tree gets taller.
    ///
    /// # Errors
    /// - `Error::ReadOnly` for an index opened with [`OpenMode::Read`]
    /// - I/O and corruption errors from reading or writing nodes
    pub fn insert(&mut self, key: Key, rid: RecordId) -> Result<()> {
        if self.mode == OpenMode::Read {
            return Err(Error::ReadOnly);
        }

        if self.meta.is_empty() {
            let mut leaf = LeafNode::new(self.config.leaf_capacity);
            leaf.insert(key, rid)?;
            let pid = self.disk.append_page(&leaf.to_page())?;
            self.set_meta(IndexMeta { root: pid, height: 1 });
            debug!("created root leaf {}", pid);
            return Ok(());
        }

        let (leaf_pid, mut path) = self.descend(key)?;
        let mut leaf = self.read_leaf(leaf_pid)?;
        match leaf.insert(key, rid) {
            Ok(()) => return leaf.write(leaf_pid, &mut self.disk),
            Err(Error::NodeFull) => {}
            Err(e) => return Err(e),
        }

        let split = leaf.insert_and_split(key, rid);
        let sibling_pid = self.disk.append_page(&split.sibling.to_page())?;
        leaf.set_next_node_ptr(Some(sibling_pid));
        leaf.write(leaf_pid, &mut self.disk)?;
        debug!(
            "split leaf {} -> {}, separator {}",
            leaf_pid, sibling_pid, split.separator
        );

        let mut separator = split.separator;
        let mut right = sibling_pid;

        while let Some(parent_pid) = path.pop() {
            let mut parent = self.read_internal(parent_pid)?;
            match parent.insert(separator, right) {
                Ok(()) => return parent.write(parent_pid, &mut self.disk),
                Err(Error::NodeFull) => {}
                Err(e) => return Err(e),
            }

            let split = parent.insert_and_split(separator, right);
            right = self.disk.append_page(&split.sibling.to_page())?;
            parent.write(parent_pid, &mut self.disk)?;
            separator = split.separator;
            debug!(
                "split internal {} -> {}, separator {}",
                parent_pid, right, separator
            );
        }

        let root = InternalNode::new_root(
            self.config.internal_capacity,
            separator,
            self.meta.root,
            right,
        );
        let root_pid = self.disk.append_page(&root.to_page())?;
        self.set_meta(IndexMeta {
            root: root_pid,
            height: self.meta.height + 1,
        });
        debug!("new root {}, height {}", root_pid, self.meta.height);
        Ok(())
    }

    fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
        self.meta_dirty = true;
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Walk from the root to the leaf that may hold `key`.
    ///
    /// Returns the leaf and the internal pages visited, root first.
    fn descend(&mut self, key: Key) -> Result<(PageId, Vec<PageId>)> {
        let levels = self.meta.height.saturating_sub(1) as usize;
        let mut path = Vec::with_capacity(levels);
        let mut pid = self.meta.root;

        for _ in 0..levels {
            let node = self.read_internal(pid)?;
            path.push(pid);
            pid = node.locate_child_ptr(key);
        }

        Ok((pid, path))
    }

    /// Find `key`.
    ///
    /// `Lookup::Found` points at the entry. `Lookup::NotFound` points at
    /// the insertion point in the leaf where the key would live, so
    /// [`read_forward`](Self::read_forward) continues with the next larger
    /// key; for an empty tree the cursor is [`Cursor::END`].
    pub fn locate(&mut self, key: Key) -> Result<Lookup> {
        if self.meta.is_empty() {
            return Ok(Lookup::NotFound(Cursor::END));
        }

        let (leaf_pid, _) = self.descend(key)?;
        let leaf = self.read_leaf(leaf_pid)?;
        Ok(match leaf.locate(key) {
            Ok(eid) => Lookup::Found(Cursor::new(leaf_pid, eid)),
            Err(eid) => Lookup::NotFound(Cursor::new(leaf_pid, eid)),
        })
    }

    /// Cursor at the smallest key, or [`Cursor::END`] for an empty tree.
    pub fn first_cursor(&mut self) -> Result<Cursor> {
        if self.meta.is_empty() {
            return Ok(Cursor::END);
        }

        let mut pid = self.meta.root;
        for _ in 1..self.meta.height {
            pid = self.read_internal(pid)?.children()[0];
        }
        Ok(Cursor::new(pid, 0))
    }

    /// Read the entry under `cursor` and advance it.
    ///
    /// After the last entry of a leaf the cursor moves to the first entry of
    /// the next leaf, or to [`Cursor::END`] after the last leaf. A cursor
    /// one past the last entry of a leaf (as `locate` may return) first
    /// moves on to the next leaf.
    ///
    /// # Errors
    /// - `Error::InvalidCursor` if the cursor is not on a node page,
    ///   including [`Cursor::END`]
    /// - `Error::InvalidIndex` if the entry index is beyond the leaf
    /// - I/O and corruption errors from reading the leaf
    pub fn read_forward(&mut self, cursor: &mut Cursor) -> Result<(Key, RecordId)> {
        loop {
            if !self.is_node_page(cursor.pid) {
                return Err(Error::InvalidCursor(cursor.pid));
            }

            let leaf = self.read_leaf(cursor.pid)?;
            if leaf.key_count() == 0 {
                return Err(Error::CorruptPage {
                    page: cursor.pid,
                    reason: "empty leaf in index".into(),
                });
            }
            let after = |leaf: &LeafNode| {
                leaf.next_node_ptr()
                    .map_or(Cursor::END, |next| Cursor::new(next, 0))
            };

            if cursor.eid == leaf.key_count() {
                *cursor = after(&leaf);
                continue;
            }

            let entry = leaf.read_entry(cursor.eid)?;
            if cursor.eid + 1 < leaf.key_count() {
                cursor.eid += 1;
            } else {
                *cursor = after(&leaf);
            }
            return Ok(entry);
        }
    }

    /// Iterate over every entry in key order.
    pub fn scan(&mut self) -> Result<IndexScan<'_>> {
        let cursor = self.first_cursor()?;
        Ok(IndexScan::new(self, cursor, Key::MIN))
    }

    /// Iterate over entries with keys `>= key`, in key order.
    ///
    /// Equal keys route right, so copies of a duplicated `key` may sit in
    /// leaves left of the one `locate(key)` reaches. The scan starts where
    /// `key - 1` would be found instead and skips anything below `key`.
    pub fn scan_from(&mut self, key: Key) -> Result<IndexScan<'_>> {
        let cursor = match key.checked_sub(1) {
            Some(below) => self.locate(below)?.cursor(),
            None => self.first_cursor()?,
        };
        Ok(IndexScan::new(self, cursor, key))
    }

    // ========================================================================
    // Node access
    // ========================================================================

    fn is_node_page(&self, pid: PageId) -> bool {
        pid != PageId::META && pid.0 < self.disk.page_count()
    }

    pub(super) fn read_leaf(&mut self, pid: PageId) -> Result<LeafNode> {
        LeafNode::read(pid, &mut self.disk, self.config.leaf_capacity)
    }

    pub(super) fn read_internal(&mut self, pid: PageId) -> Result<InternalNode> {
        InternalNode::read(pid, &mut self.disk, self.config.internal_capacity)
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        if self.meta_dirty && self.mode == OpenMode::Write {
            warn!(
                "index dropped without close; saving metadata (root {}, height {})",
                self.meta.root, self.meta.height
            );
            if let Err(e) = self.save_meta() {
                error!("failed to save index metadata on drop: {}", e);
            }
        }
    }
}
