//! Engine - bulk load and conditional select over record tables.
//!
//! A table `t` lives in `<dir>/t.tbl`; when loaded with an index its B+Tree
//! is `<dir>/t.idx`. `select` walks the index over the key range implied by
//! the key conditions when it can, and scans the whole table otherwise.

use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, error};

use crate::common::config::BTreeConfig;
use crate::common::{Error, PageId, RecordId, Result};
use crate::index::btree::BTreeIndex;
use crate::storage::OpenMode;

use super::load::{parse_leading_int, parse_load_line};
use super::RecordFile;

/// Column a condition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Key,
    Value,
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparator {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Le => ordering != Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
        }
    }
}

/// One `WHERE` term: `attr comp value`.
///
/// For key conditions `value` is read as an integer the way load files are
/// (leading digits, 0 if none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelCond {
    pub attr: Attr,
    pub comp: Comparator,
    pub value: String,
}

impl SelCond {
    pub fn new(attr: Attr, comp: Comparator, value: impl Into<String>) -> Self {
        Self {
            attr,
            comp,
            value: value.into(),
        }
    }

    /// Condition on the key column.
    pub fn key(comp: Comparator, value: i32) -> Self {
        Self::new(Attr::Key, comp, value.to_string())
    }

    /// Condition on the value column.
    pub fn value(comp: Comparator, value: impl Into<String>) -> Self {
        Self::new(Attr::Value, comp, value)
    }

    fn key_operand(&self) -> i32 {
        parse_leading_int(&self.value)
    }

    fn matches_key(&self, key: i32) -> bool {
        self.comp.accepts(key.cmp(&self.key_operand()))
    }

    fn matches_value(&self, value: &str) -> bool {
        self.comp.accepts(value.cmp(self.value.as_str()))
    }

    /// Whether a tuple satisfies this condition.
    pub fn matches(&self, key: i32, value: &str) -> bool {
        match self.attr {
            Attr::Key => self.matches_key(key),
            Attr::Value => self.matches_value(value),
        }
    }
}

/// What `select` returns per matching tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Key,
    Value,
    All,
    Count,
}

/// One projected tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Key(i32),
    Value(String),
    Tuple(i32, String),
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Key(key) => write!(f, "{}", key),
            Row::Value(value) => write!(f, "{}", value),
            Row::Tuple(key, value) => write!(f, "{} '{}'", key, value),
        }
    }
}

/// Result of a `select`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutput {
    Rows(Vec<Row>),
    Count(usize),
}

impl SelectOutput {
    /// Number of matching tuples.
    pub fn len(&self) -> usize {
        match self {
            SelectOutput::Rows(rows) => rows.len(),
            SelectOutput::Count(count) => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects matching tuples for one projection.
struct Collector {
    projection: Projection,
    rows: Vec<Row>,
    count: usize,
}

impl Collector {
    fn new(projection: Projection) -> Self {
        Self {
            projection,
            rows: Vec::new(),
            count: 0,
        }
    }

    fn push(&mut self, key: i32, value: String) {
        self.count += 1;
        match self.projection {
            Projection::Key => self.rows.push(Row::Key(key)),
            Projection::Value => self.rows.push(Row::Value(value)),
            Projection::All => self.rows.push(Row::Tuple(key, value)),
            Projection::Count => {}
        }
    }

    fn finish(self) -> SelectOutput {
        match self.projection {
            Projection::Count => SelectOutput::Count(self.count),
            _ => SelectOutput::Rows(self.rows),
        }
    }
}

/// Inclusive key range, or `None` when the conditions contradict.
fn key_range(conds: &[SelCond]) -> Option<(i32, i32)> {
    let mut lo = i32::MIN;
    let mut hi = i32::MAX;

    for cond in conds.iter().filter(|c| c.attr == Attr::Key) {
        let v = cond.key_operand();
        match cond.comp {
            Comparator::Eq => {
                lo = lo.max(v);
                hi = hi.min(v);
            }
            Comparator::Ge => lo = lo.max(v),
            Comparator::Gt => lo = lo.max(v.checked_add(1)?),
            Comparator::Le => hi = hi.min(v),
            Comparator::Lt => hi = hi.min(v.checked_sub(1)?),
            Comparator::Ne => {}
        }
    }

    (lo <= hi).then_some((lo, hi))
}

/// Load and query front end over a directory of tables.
pub struct Engine {
    dir: PathBuf,
    index_config: BTreeConfig,
}

impl Engine {
    /// Engine over tables in `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_index_config(dir, BTreeConfig::default())
    }

    /// Engine whose indexes use the given node capacities.
    pub fn with_index_config<P: AsRef<Path>>(dir: P, index_config: BTreeConfig) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            index_config,
        }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.tbl", table))
    }

    pub fn index_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.idx", table))
    }

    /// Append every tuple of `load_file` to `table`, creating it if needed.
    ///
    /// With `with_index`, each `(key, record id)` is also inserted into the
    /// table's B+Tree. An index that already exists is kept current even
    /// without `with_index`, and an empty one is first filled from the
    /// records already in the table. Blank lines are skipped. Returns the
    /// number of tuples loaded.
    ///
    /// # Errors
    /// `Error::InvalidFileFormat` with the 1-based line number of the first
    /// line without a comma; everything before it stays loaded.
    pub fn load<P: AsRef<Path>>(
        &self,
        table: &str,
        load_file: P,
        with_index: bool,
    ) -> Result<usize> {
        let input = BufReader::new(File::open(load_file.as_ref())?);
        let mut records = RecordFile::open(self.table_path(table), OpenMode::Write)?;
        let index_path = self.index_path(table);
        let mut index = if with_index || index_path.exists() {
            let mut index =
                BTreeIndex::open_with_config(&index_path, OpenMode::Write, self.index_config)?;
            if index.height() == 0 {
                let existing = Self::index_existing(&mut records, &mut index)?;
                if existing > 0 {
                    debug!("indexed {} existing tuples of {}", existing, table);
                }
            }
            Some(index)
        } else {
            None
        };

        let mut loaded = 0;
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = parse_load_line(&line).ok_or_else(|| {
                error!(
                    "table {}: could not parse line {} of {}",
                    table,
                    i + 1,
                    load_file.as_ref().display()
                );
                Error::InvalidFileFormat { line: i + 1 }
            })?;

            let rid = records.append(key, &value)?;
            if let Some(index) = index.as_mut() {
                index.insert(key, rid)?;
            }
            loaded += 1;
        }

        if let Some(index) = index {
            index.close()?;
        }
        records.close()?;

        debug!("loaded {} tuples into {}", loaded, table);
        Ok(loaded)
    }

    /// Insert every record of `records` into `index`.
    fn index_existing(records: &mut RecordFile, index: &mut BTreeIndex) -> Result<usize> {
        let end = records.end_rid();
        let mut rid = RecordId::new(PageId::new(0), 0);
        let mut count = 0;

        while rid < end {
            let (key, _) = records.read(rid)?;
            index.insert(key, rid)?;
            rid = rid.next();
            count += 1;
        }
        Ok(count)
    }

    /// Select tuples of `table` satisfying every condition.
    ///
    /// # Errors
    /// `Error::TableNotFound` if the table file does not exist.
    pub fn select(
        &self,
        projection: Projection,
        table: &str,
        conds: &[SelCond],
    ) -> Result<SelectOutput> {
        let table_path = self.table_path(table);
        if !table_path.exists() {
            return Err(Error::TableNotFound(table.to_string()));
        }
        let mut records = RecordFile::open(table_path, OpenMode::Read)?;

        let use_index = self.index_path(table).exists()
            && conds
                .iter()
                .any(|c| c.attr == Attr::Key && c.comp != Comparator::Ne);

        let output = if use_index {
            self.select_with_index(projection, table, conds, &mut records)
        } else {
            Self::select_with_scan(projection, conds, &mut records)
        };

        records.close()?;
        output
    }

    fn select_with_scan(
        projection: Projection,
        conds: &[SelCond],
        records: &mut RecordFile,
    ) -> Result<SelectOutput> {
        let mut out = Collector::new(projection);
        let end = records.end_rid();
        let mut rid = RecordId::new(PageId::new(0), 0);

        while rid < end {
            let (key, value) = records.read(rid)?;
            if conds.iter().all(|c| c.matches(key, &value)) {
                out.push(key, value);
            }
            rid = rid.next();
        }

        Ok(out.finish())
    }

    fn select_with_index(
        &self,
        projection: Projection,
        table: &str,
        conds: &[SelCond],
        records: &mut RecordFile,
    ) -> Result<SelectOutput> {
        let mut out = Collector::new(projection);
        let Some((lo, hi)) = key_range(conds) else {
            debug!("select on {}: empty key range", table);
            return Ok(out.finish());
        };
        debug!("select on {} via index over [{}, {}]", table, lo, hi);

        let needs_value = !matches!(projection, Projection::Key | Projection::Count)
            || conds.iter().any(|c| c.attr == Attr::Value);

        let mut index =
            BTreeIndex::open_with_config(self.index_path(table), OpenMode::Read, self.index_config)?;

        for entry in index.scan_from(lo)? {
            let (key, rid) = entry?;
            if key > hi {
                break;
            }
            if !conds
                .iter()
                .filter(|c| c.attr == Attr::Key)
                .all(|c| c.matches_key(key))
            {
                continue;
            }

            let value = if needs_value {
                records.read(rid)?.1
            } else {
                String::new()
            };
            if conds
                .iter()
                .filter(|c| c.attr == Attr::Value)
                .all(|c| c.matches_value(&value))
            {
                out.push(key, value);
            }
        }

        index.close()?;
        Ok(out.finish())
    }
}
