//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O
//! between disk and memory. Node and record types decode themselves from a
//! page and encode themselves back into one; nothing reinterprets the bytes
//! in place.

use crate::common::config::PAGE_SIZE;

use super::page_header::PageHeader;

/// A page of data (4KB, 4KB-aligned).
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code (copying 4KB
/// should be explicit). A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use leafdb::storage::page::Page;
///
/// let mut page = Page::new();
/// page.put_i32(8, -5);
/// assert_eq!(page.get_i32(8), -5);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Read a little-endian u16 at `offset`.
    #[inline]
    pub fn get_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    /// Write a little-endian u16 at `offset`.
    #[inline]
    pub fn put_u16(&mut self, offset: usize, value: u16) {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a little-endian u32 at `offset`.
    #[inline]
    pub fn get_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Write a little-endian u32 at `offset`.
    #[inline]
    pub fn put_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a little-endian i32 at `offset`.
    #[inline]
    pub fn get_i32(&self, offset: usize) -> i32 {
        self.get_u32(offset) as i32
    }

    /// Write a little-endian i32 at `offset`.
    #[inline]
    pub fn put_i32(&mut self, offset: usize, value: i32) {
        self.put_u32(offset, value as u32);
    }

    /// Read the page header.
    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    /// Write a page header.
    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Compute and store checksum in the header.
    ///
    /// Call this after all modifications to the page are complete.
    pub fn update_checksum(&mut self) {
        let checksum = PageHeader::compute_checksum(&self.data);
        self.put_u32(PageHeader::OFFSET_CHECKSUM, checksum);
    }

    /// Verify the page checksum is valid.
    pub fn verify_checksum(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}

// ============================================================================
// TESTS
// ============================================================================
