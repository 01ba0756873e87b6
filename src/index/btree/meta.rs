//! Index metadata stored in page 0.

use crate::common::PageId;
use crate::storage::page::Page;

/// Root page and height of a B+Tree.
///
/// # Layout (page 0)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     root page id (i32, little-endian, -1 = empty tree)
/// 4       4     tree height (i32, little-endian)
/// 8       ...   zero
/// ```
///
/// Height 0 is the empty tree, 1 means the root is a leaf, and `n` means
/// every root-to-leaf path crosses `n - 1` internal nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMeta {
    pub root: PageId,
    pub height: u32,
}

impl IndexMeta {
    pub const OFFSET_ROOT: usize = 0;
    pub const OFFSET_HEIGHT: usize = 4;

    pub const EMPTY: IndexMeta = IndexMeta {
        root: PageId::INVALID,
        height: 0,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    /// Encode into a zero-filled page.
    pub fn to_page(&self) -> Page {
        let mut page = Page::new();
        page.put_i32(Self::OFFSET_ROOT, self.root.0 as i32);
        page.put_i32(Self::OFFSET_HEIGHT, self.height as i32);
        page
    }

    /// Decode page 0.
    ///
    /// Returns `None` unless the root is a positive page id and the height
    /// is non-negative. A zeroed or garbage page therefore reads as "no
    /// usable metadata" rather than an error.
    pub fn from_page(page: &Page) -> Option<Self> {
        let root = page.get_i32(Self::OFFSET_ROOT);
        let height = page.get_i32(Self::OFFSET_HEIGHT);
        if root > 0 && height >= 0 {
            Some(Self {
                root: PageId::new(root as u32),
                height: height as u32,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_layout() {
        let meta = IndexMeta {
            root: PageId::new(0x0102),
            height: 3,
        };
        let page = meta.to_page();

        assert_eq!(&page.as_slice()[0..4], &[0x02, 0x01, 0, 0]);
        assert_eq!(&page.as_slice()[4..8], &[3, 0, 0, 0]);
        assert!(page.as_slice()[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_roundtrip() {
        let meta = IndexMeta {
            root: PageId::new(17),
            height: 4,
        };
        assert_eq!(IndexMeta::from_page(&meta.to_page()), Some(meta));
    }

    #[test]
    fn test_empty_encodes_minus_one() {
        let page = IndexMeta::EMPTY.to_page();
        assert_eq!(page.get_i32(IndexMeta::OFFSET_ROOT), -1);
        assert_eq!(page.get_i32(IndexMeta::OFFSET_HEIGHT), 0);
        assert_eq!(IndexMeta::from_page(&page), None);
    }

    #[test]
    fn test_zeroed_and_negative_pages_rejected() {
        assert_eq!(IndexMeta::from_page(&Page::new()), None);

        let mut page = Page::new();
        page.put_i32(IndexMeta::OFFSET_ROOT, 5);
        page.put_i32(IndexMeta::OFFSET_HEIGHT, -2);
        assert_eq!(IndexMeta::from_page(&page), None);
    }
}
