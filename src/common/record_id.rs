//! Record identifier type.

use std::fmt;

use crate::common::config::RECORDS_PER_PAGE;
use crate::common::PageId;

/// Locates a record in a record file: the page it lives on and its slot.
///
/// The B+Tree stores these verbatim next to each key and hands them back
/// untouched; only [`RecordFile`](crate::execution::RecordFile) knows what
/// they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Page holding the record.
    pub pid: PageId,
    /// Slot within the page.
    pub sid: u32,
}

impl RecordId {
    /// Create a new RecordId.
    #[inline]
    pub fn new(pid: PageId, sid: u32) -> Self {
        Self { pid, sid }
    }

    /// The record slot following this one in a record file.
    pub fn next(self) -> Self {
        if self.sid as usize + 1 >= RECORDS_PER_PAGE {
            Self::new(PageId::new(self.pid.0 + 1), 0)
        } else {
            Self::new(self.pid, self.sid + 1)
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({}, {})", self.pid.0, self.sid)
    }
}
