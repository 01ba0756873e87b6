//! Index structures.
//!
//! - [`btree`] - disk-resident B+Tree keyed by `i32`

pub mod btree;
