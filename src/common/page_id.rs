//! Page identifier type.

use std::fmt;

/// Identifies a page on disk.
///
/// Page 0 of an index file holds the index metadata, so B+Tree nodes
/// always live at page 1 or later. That also lets leaf pages store "no next
/// leaf" as a plain 0.
///
/// # Example
/// ```
/// use leafdb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Used to represent "no page". Encoded as a signed 4-byte integer this
    /// is -1, the empty-tree root marker in the metadata page.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// The reserved metadata page.
    pub const META: PageId = PageId(0);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Decode an optional page pointer where 0 means "none".
    #[inline]
    pub fn from_link(raw: u32) -> Option<PageId> {
        if raw == 0 {
            None
        } else {
            Some(PageId(raw))
        }
    }

    /// Encode an optional page pointer where 0 means "none".
    #[inline]
    pub fn to_link(link: Option<PageId>) -> u32 {
        link.map_or(0, |pid| pid.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
