//! Node page header: a type tag and a CRC32 over the page.
//!
//! Only B+Tree node pages carry a header. The index metadata page and record
//! pages have fixed layouts of their own.

use std::ops::Range;

/// Kind of node stored in a page.
///
/// Stored as a single byte; any unknown tag (including the 0 of a page that
/// was allocated but never written) decodes as `Invalid`.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    #[default]
    Invalid = 0,
    /// Routing node: keys and child page ids.
    BTreeInternal = 2,
    /// Leaf node: keys, record ids and the next-leaf link.
    BTreeLeaf = 3,
}

impl From<u8> for PageType {
    fn from(tag: u8) -> Self {
        match tag {
            2 => PageType::BTreeInternal,
            3 => PageType::BTreeLeaf,
            _ => PageType::Invalid,
        }
    }
}

/// First [`SIZE`](Self::SIZE) bytes of every node page.
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page type
/// 1       4     CRC32 of the whole page, this field read as zero (LE)
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub checksum: u32,
}

impl PageHeader {
    pub const SIZE: usize = 5;
    pub const OFFSET_CHECKSUM: usize = 1;

    const CHECKSUM: Range<usize> = Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4;

    /// Header for a page about to be encoded; the checksum is filled in
    /// later by [`Page::update_checksum`](super::Page::update_checksum).
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            checksum: 0,
        }
    }

    /// Decode the header at the start of `page_data`.
    pub fn from_bytes(page_data: &[u8]) -> Self {
        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&page_data[Self::CHECKSUM]);
        Self {
            page_type: PageType::from(page_data[0]),
            checksum: u32::from_le_bytes(checksum),
        }
    }

    /// Encode into the start of `page_data`.
    pub fn write_to(&self, page_data: &mut [u8]) {
        page_data[0] = self.page_type as u8;
        page_data[Self::CHECKSUM].copy_from_slice(&self.checksum.to_le_bytes());
    }

    /// CRC32 of `page_data` with the checksum field treated as zero.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::CHECKSUM.start]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::CHECKSUM.end..]);
        hasher.finalize()
    }

    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}
