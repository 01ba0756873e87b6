//! Common types and utilities shared across leafdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`BTreeConfig`](config::BTreeConfig)
//! - Error types
//! - Identifiers (PageId, RecordId)

pub mod config;
pub mod error;
mod page_id;
mod record_id;

pub use error::{Error, Result};
pub use page_id::PageId;
pub use record_id::RecordId;
