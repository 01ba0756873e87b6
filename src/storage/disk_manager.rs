//! Disk Manager - low-level file I/O for fixed-size pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Appending new pages
//! - Managing the page file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// How a page file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, no mutation.
    Read,
    /// Create the file if needed and allow writes.
    Write,
}

/// Manages disk I/O for a single page file.
///
/// # File Layout
/// The file is stored as pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**; every call takes `&mut self`.
///
/// # Durability
/// Writes go to the OS page cache. [`sync`](Self::sync) and
/// [`close`](Self::close) fsync the file.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
    read_only: bool,
}

impl DiskManager {
    /// Create a new page file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        debug!("created page file {}", path.as_ref().display());
        Ok(Self {
            file,
            page_count: 0,
            read_only: false,
        })
    }

    /// Open an existing page file for reading and writing.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Self::from_file(file, false)
    }

    /// Open an existing page file for reading only.
    ///
    /// Writes and appends fail with [`Error::ReadOnly`].
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(&path)?;
        Self::from_file(file, true)
    }

    /// Open an existing page file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Open read-only, or read-write creating the file if missing.
    pub fn open_with_mode<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        match mode {
            OpenMode::Read => Self::open_read_only(path),
            OpenMode::Write => Self::open_or_create(path),
        }
    }

    fn from_file(file: File, read_only: bool) -> Result<Self> {
        // A trailing partial page is ignored
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            page_count,
            read_only,
        })
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// The page must have been previously allocated.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated, or
    /// `Error::ReadOnly` for a read-only file.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;

        Ok(())
    }

    /// Append a page to the end of the file.
    ///
    /// Returns the `PageId` of the new page.
    pub fn append_page(&mut self, page: &Page) -> Result<PageId> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }

        let page_id = PageId::new(self.page_count);
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;

        self.page_count += 1;
        Ok(page_id)
    }

    /// Allocate a new zeroed page at the end of the file.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        self.append_page(&Page::new())
    }

    /// Get the number of pages in the file.
    ///
    /// This is also the id the next appended page will receive; 0 means
    /// the file was just created.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// One past the last allocated page id.
    #[inline]
    pub fn end_page_id(&self) -> PageId {
        PageId::new(self.page_count)
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    /// Whether the file was opened read-only.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Flush written pages to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        if !self.read_only {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Sync and close the file.
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        debug!("closed page file ({} pages)", self.page_count);
        Ok(())
    }
}
