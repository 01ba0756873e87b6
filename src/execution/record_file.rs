//! RecordFile - a flat table of fixed-size `(key, value)` records.

use std::path::Path;

use log::debug;

use crate::common::config::{
    RECORDS_PER_PAGE, RECORD_PAGE_HEADER_SIZE, RECORD_SIZE, RECORD_VALUE_SIZE,
};
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::page::Page;
use crate::storage::{DiskManager, OpenMode};

/// Append-only table of `(i32, String)` records.
///
/// # Page Layout
/// ```text
/// Offset        Size  Field
/// ------        ----  -----
/// 0             4     record count (u32)
/// 4 + 104*i     4     key (i32)
/// 8 + 104*i     100   value (UTF-8, NUL padded)
/// ```
/// Records fill pages in order, so every page but the last is full and
/// [`end_rid`](Self::end_rid) is one slot past the last record.
pub struct RecordFile {
    disk: DiskManager,
    end_rid: RecordId,
}

impl RecordFile {
    /// Open a record file, creating it in write mode if missing.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let mut disk = DiskManager::open_with_mode(path, mode)?;

        let end_rid = match disk.page_count() {
            0 => RecordId::new(PageId::new(0), 0),
            pages => {
                let last = PageId::new(pages - 1);
                let count = disk.read_page(last)?.get_u32(0) as usize;
                if count >= RECORDS_PER_PAGE {
                    RecordId::new(PageId::new(pages), 0)
                } else {
                    RecordId::new(last, count as u32)
                }
            }
        };

        Ok(Self { disk, end_rid })
    }

    /// One slot past the last record.
    #[inline]
    pub fn end_rid(&self) -> RecordId {
        self.end_rid
    }

    /// Append a record and return where it was stored.
    ///
    /// Values longer than the fixed column are cut at a character boundary.
    pub fn append(&mut self, key: i32, value: &str) -> Result<RecordId> {
        let rid = self.end_rid;

        let mut page = if rid.pid.0 < self.disk.page_count() {
            self.disk.read_page(rid.pid)?
        } else {
            Page::new()
        };

        let offset = Self::slot_offset(rid.sid);
        page.put_i32(offset, key);
        let value_bytes = truncate(value).as_bytes();
        let field = &mut page.as_mut_slice()[offset + 4..offset + RECORD_SIZE];
        field.fill(0);
        field[..value_bytes.len()].copy_from_slice(value_bytes);
        page.put_u32(0, rid.sid + 1);

        if rid.pid.0 < self.disk.page_count() {
            self.disk.write_page(rid.pid, &page)?;
        } else {
            self.disk.append_page(&page)?;
        }

        self.end_rid = rid.next();
        Ok(rid)
    }

    /// Read the record at `rid`.
    pub fn read(&mut self, rid: RecordId) -> Result<(i32, String)> {
        if rid >= self.end_rid || rid.sid as usize >= RECORDS_PER_PAGE {
            return Err(Error::InvalidRecord(rid));
        }

        let page = self.disk.read_page(rid.pid)?;
        let offset = Self::slot_offset(rid.sid);
        let key = page.get_i32(offset);

        let field = &page.as_slice()[offset + 4..offset + RECORD_SIZE];
        let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let value = String::from_utf8_lossy(&field[..len]).into_owned();

        Ok((key, value))
    }

    /// Sync and close the file.
    pub fn close(self) -> Result<()> {
        debug!("closing record file at {}", self.end_rid);
        self.disk.close()
    }

    fn slot_offset(sid: u32) -> usize {
        RECORD_PAGE_HEADER_SIZE + sid as usize * RECORD_SIZE
    }
}

fn truncate(value: &str) -> &str {
    if value.len() <= RECORD_VALUE_SIZE {
        return value;
    }
    let mut end = RECORD_VALUE_SIZE;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
