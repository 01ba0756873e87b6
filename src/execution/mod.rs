//! Execution layer - record tables and the load/select engine.
//!
//! - [`RecordFile`] - fixed-size `(key, value)` records addressed by [`RecordId`](crate::common::RecordId)
//! - [`Engine`] - bulk load with optional index build, and conditional select

mod engine;
mod load;
mod record_file;

pub use engine::{Attr, Comparator, Engine, Projection, Row, SelCond, SelectOutput};
pub use load::parse_load_line;
pub use record_file::RecordFile;
