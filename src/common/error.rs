//! Error types for leafdb.

use thiserror::Error as ThisError;

use crate::common::{PageId, RecordId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in leafdb.
///
/// A key that is absent from the index is not an error: searches report it
/// through [`Lookup::NotFound`](crate::index::btree::Lookup), which still
/// carries a usable cursor.
#[derive(Debug, ThisError)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// A node has no room for another entry.
    ///
    /// The index turns this into a split; it never reaches callers of
    /// `BTreeIndex::insert`.
    #[error("node is full")]
    NodeFull,

    /// Entry index out of bounds within a node.
    #[error("entry index {eid} out of bounds for node with {count} entries")]
    InvalidIndex { eid: usize, count: usize },

    /// Cursor does not point at a data page, or ran past the last leaf.
    #[error("invalid cursor at {0}")]
    InvalidCursor(PageId),

    /// A page did not decode as the node type the caller expected.
    #[error("corrupted {page}: {reason}")]
    CorruptPage { page: PageId, reason: String },

    /// A line of a load file could not be parsed.
    #[error("invalid file format at line {line}")]
    InvalidFileFormat { line: usize },

    /// Mutation attempted on an index opened for reading.
    #[error("index is opened read-only")]
    ReadOnly,

    /// Node capacities out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record id past the end of a record file.
    #[error("{0} does not exist")]
    InvalidRecord(RecordId),

    /// Table file missing.
    #[error("table {0} does not exist")]
    TableNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::InvalidIndex { eid: 7, count: 3 };
        assert_eq!(
            format!("{}", err),
            "entry index 7 out of bounds for node with 3 entries"
        );

        let err = Error::InvalidCursor(PageId::INVALID);
        assert_eq!(format!("{}", err), "invalid cursor at Page(INVALID)");

        let err = Error::InvalidRecord(RecordId::new(PageId::new(2), 9));
        assert_eq!(format!("{}", err), "Record(2, 9) does not exist");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: Error = io_err.into();
        assert!(err.source().is_some());
        assert!(Error::NodeFull.source().is_none());
    }
}
