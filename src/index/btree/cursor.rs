//! Cursors and forward scans over the leaf chain.

use std::fmt;

use crate::common::{Error, PageId, RecordId, Result};

use super::{BTreeIndex, Key};

/// A position in the global key order: a leaf page and an entry in it.
///
/// Cursors are plain values; they stay meaningful across calls as long as
/// the index is not modified in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub pid: PageId,
    pub eid: usize,
}

impl Cursor {
    /// Past the last entry of the index (also the empty-tree position).
    pub const END: Cursor = Cursor {
        pid: PageId::INVALID,
        eid: 0,
    };

    #[inline]
    pub fn new(pid: PageId, eid: usize) -> Self {
        Self { pid, eid }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        !self.pid.is_valid()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            write!(f, "Cursor(END)")
        } else {
            write!(f, "Cursor({}, {})", self.pid.0, self.eid)
        }
    }
}

/// Outcome of [`BTreeIndex::locate`].
///
/// Both variants carry a cursor. `NotFound` points at the first entry
/// greater than the search key, so reading forward from it continues in key
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(Cursor),
    NotFound(Cursor),
}

impl Lookup {
    #[inline]
    pub fn cursor(&self) -> Cursor {
        match *self {
            Lookup::Found(cursor) | Lookup::NotFound(cursor) => cursor,
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Iterator over `(key, record id)` pairs driven by
/// [`BTreeIndex::read_forward`].
///
/// Entries with keys below `from` are skipped. Stops at the end of the leaf
/// chain, or after yielding the first error.
pub struct IndexScan<'a> {
    index: &'a mut BTreeIndex,
    cursor: Cursor,
    from: Key,
    failed: bool,
}

impl<'a> IndexScan<'a> {
    pub(crate) fn new(index: &'a mut BTreeIndex, cursor: Cursor, from: Key) -> Self {
        Self {
            index,
            cursor,
            from,
            failed: false,
        }
    }

    /// Position of the next entry to be yielded.
    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl Iterator for IndexScan<'_> {
    type Item = Result<(Key, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed || self.cursor.is_end() {
                return None;
            }
            match self.index.read_forward(&mut self.cursor) {
                Ok((key, _)) if key < self.from => continue,
                // a past-the-end insertion point on the last leaf hops to END
                Err(Error::InvalidCursor(pid)) if pid == PageId::INVALID => {
                    self.cursor = Cursor::END;
                    return None;
                }
                item => {
                    self.failed = item.is_err();
                    return Some(item);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_cursor() {
        assert!(Cursor::END.is_end());
        assert!(!Cursor::new(PageId::new(1), 0).is_end());
        assert_eq!(format!("{}", Cursor::END), "Cursor(END)");
        assert_eq!(format!("{}", Cursor::new(PageId::new(3), 2)), "Cursor(3, 2)");
    }

    #[test]
    fn test_lookup_accessors() {
        let cursor = Cursor::new(PageId::new(2), 1);
        assert!(Lookup::Found(cursor).is_found());
        assert!(!Lookup::NotFound(cursor).is_found());
        assert_eq!(Lookup::NotFound(cursor).cursor(), cursor);
    }
}
