//! leafdb - a disk-resident B+Tree index over fixed-size records.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                             leafdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Query Layer (execution/)                    │   │
//! │  │        Engine::load / Engine::select + RecordFile        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓ (index-assisted)        ↓ (full scan)         │
//! │  ┌──────────────────────────────┐         │                     │
//! │  │    Index Layer (index/)      │         │                     │
//! │  │ BTreeIndex → Internal → Leaf │         │                     │
//! │  │     Cursor / IndexScan       │         │                     │
//! │  └──────────────────────────────┘         │                     │
//! │                 ↓                         ↓                     │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │          DiskManager + Page + PageHeader                 │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, Error, config)
//! - [`storage`] - Disk I/O and page formats
//! - [`index`] - The B+Tree index
//! - [`execution`] - Record tables, bulk load and select
//!
//! # Quick Start
//! ```no_run
//! use leafdb::{BTreeIndex, Lookup, OpenMode, PageId, RecordId};
//!
//! let mut index = BTreeIndex::open("movie.idx", OpenMode::Write).unwrap();
//! index.insert(272, RecordId::new(PageId::new(0), 0)).unwrap();
//!
//! if let Lookup::Found(mut cursor) = index.locate(272).unwrap() {
//!     let (key, rid) = index.read_forward(&mut cursor).unwrap();
//!     println!("{} -> {}", key, rid);
//! }
//! index.close().unwrap();
//! ```

pub mod common;
pub mod execution;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BTreeConfig, PAGE_SIZE};
pub use common::{Error, PageId, RecordId, Result};

pub use execution::{Engine, RecordFile};
pub use index::btree::{BTreeIndex, Cursor, Lookup};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::{DiskManager, OpenMode};
