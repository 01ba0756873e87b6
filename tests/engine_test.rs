//! Integration tests for load and select.
//!
//! Every query is run against a table loaded with and without an index; both
//! paths must agree up to row order.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use leafdb::execution::{Comparator, Projection, Row, SelCond, SelectOutput};
use leafdb::{BTreeConfig, BTreeIndex, Engine, Error, OpenMode};
use tempfile::{tempdir, TempDir};

const MOVIES: &[&str] = &[
    "272,'Baby Take a Bow'",
    "216,\"Shirley Temple\"",
    "3, 'Third'",
    "1000,plain value",
    "57,'Alpha'",
    "12,",
    "-4,'Negative'",
    "808,'Zulu'",
];

fn write_load_file(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path
}

/// Engine with `plain` loaded without an index and `indexed` loaded with one.
fn setup(lines: &[&str]) -> (Engine, TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let load = write_load_file(dir.path(), "movie.del", lines);
    let engine = Engine::with_index_config(dir.path(), BTreeConfig::new(3, 3));

    assert_eq!(engine.load("plain", &load, false).unwrap(), lines.len());
    assert_eq!(engine.load("indexed", &load, true).unwrap(), lines.len());
    (engine, dir)
}

fn sorted_rows(out: SelectOutput) -> Vec<String> {
    let SelectOutput::Rows(rows) = out else {
        panic!("expected rows, got {:?}", out);
    };
    let mut rows: Vec<String> = rows.iter().map(Row::to_string).collect();
    rows.sort();
    rows
}

fn both(
    engine: &Engine,
    projection: Projection,
    conds: &[SelCond],
) -> (SelectOutput, SelectOutput) {
    (
        engine.select(projection, "plain", conds).unwrap(),
        engine.select(projection, "indexed", conds).unwrap(),
    )
}

#[test]
fn test_select_all_without_conditions() {
    let (engine, _dir) = setup(MOVIES);
    let (plain, indexed) = both(&engine, Projection::All, &[]);

    assert_eq!(plain.len(), MOVIES.len());
    assert_eq!(sorted_rows(plain), sorted_rows(indexed));
}

#[test]
fn test_key_equality() {
    let (engine, _dir) = setup(MOVIES);
    let conds = [SelCond::key(Comparator::Eq, 272)];
    let (plain, indexed) = both(&engine, Projection::All, &conds);

    assert_eq!(
        indexed,
        SelectOutput::Rows(vec![Row::Tuple(272, "Baby Take a Bow".into())])
    );
    assert_eq!(plain, indexed);
}

#[test]
fn test_key_range_uses_index_order() {
    let (engine, _dir) = setup(MOVIES);
    let conds = [
        SelCond::key(Comparator::Gt, 3),
        SelCond::key(Comparator::Lt, 808),
    ];

    let indexed = engine.select(Projection::Key, "indexed", &conds).unwrap();
    assert_eq!(
        indexed,
        SelectOutput::Rows(vec![Row::Key(12), Row::Key(57), Row::Key(216), Row::Key(272)])
    );

    let plain = engine.select(Projection::Key, "plain", &conds).unwrap();
    assert_eq!(sorted_rows(plain), sorted_rows(indexed));
}

#[test]
fn test_value_conditions_combined_with_key_range() {
    let (engine, _dir) = setup(MOVIES);
    let conds = [
        SelCond::key(Comparator::Ge, 0),
        SelCond::value(Comparator::Ge, "S"),
    ];
    let (plain, indexed) = both(&engine, Projection::Value, &conds);

    assert_eq!(
        sorted_rows(indexed.clone()),
        vec!["Shirley Temple", "Third", "Zulu", "plain value"]
    );
    assert_eq!(sorted_rows(plain), sorted_rows(indexed));
}

#[test]
fn test_count() {
    let (engine, _dir) = setup(MOVIES);

    let (plain, indexed) = both(&engine, Projection::Count, &[SelCond::key(Comparator::Le, 57)]);
    assert_eq!(plain, SelectOutput::Count(4));
    assert_eq!(indexed, SelectOutput::Count(4));

    let (plain, indexed) = both(&engine, Projection::Count, &[SelCond::key(Comparator::Ne, 57)]);
    assert_eq!(plain, SelectOutput::Count(MOVIES.len() - 1));
    assert_eq!(indexed, plain);
}

#[test]
fn test_contradictory_range_is_empty() {
    let (engine, _dir) = setup(MOVIES);
    let conds = [
        SelCond::key(Comparator::Gt, 500),
        SelCond::key(Comparator::Lt, 100),
    ];
    let (plain, indexed) = both(&engine, Projection::All, &conds);

    assert!(plain.is_empty());
    assert!(indexed.is_empty());
}

#[test]
fn test_range_past_last_key() {
    let (engine, _dir) = setup(MOVIES);
    let (plain, indexed) = both(&engine, Projection::Key, &[SelCond::key(Comparator::Gt, 5000)]);

    assert!(plain.is_empty());
    assert_eq!(indexed, SelectOutput::Rows(vec![]));
}

#[test]
fn test_empty_value_loaded() {
    let (engine, _dir) = setup(MOVIES);
    let out = engine
        .select(Projection::All, "indexed", &[SelCond::key(Comparator::Eq, 12)])
        .unwrap();
    assert_eq!(out, SelectOutput::Rows(vec![Row::Tuple(12, String::new())]));
}

#[test]
fn test_large_load_builds_deep_index() {
    let dir = tempdir().unwrap();
    let lines: Vec<String> = (0..1000)
        .map(|i| format!("{},'value {}'", (i * 37) % 1000, i))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let load = write_load_file(dir.path(), "big.del", &refs);

    let engine = Engine::with_index_config(dir.path(), BTreeConfig::new(4, 4));
    assert_eq!(engine.load("big", &load, true).unwrap(), 1000);

    let mut index =
        BTreeIndex::open_with_config(engine.index_path("big"), OpenMode::Read, BTreeConfig::new(4, 4))
            .unwrap();
    assert!(index.height() >= 3);
    assert_eq!(index.validate().unwrap().entries, 1000);
    index.close().unwrap();

    let out = engine
        .select(
            Projection::Count,
            "big",
            &[SelCond::key(Comparator::Ge, 100), SelCond::key(Comparator::Lt, 200)],
        )
        .unwrap();
    assert_eq!(out, SelectOutput::Count(100));
}

#[test]
fn test_load_appends_to_existing_table() {
    let dir = tempdir().unwrap();
    let first = write_load_file(dir.path(), "a.del", &["1,'a'", "2,'b'"]);
    let second = write_load_file(dir.path(), "b.del", &["3,'c'"]);
    let engine = Engine::new(dir.path());

    engine.load("t", &first, true).unwrap();
    engine.load("t", &second, true).unwrap();

    let out = engine
        .select(Projection::Value, "t", &[SelCond::key(Comparator::Ge, 1)])
        .unwrap();
    assert_eq!(
        out,
        SelectOutput::Rows(vec![
            Row::Value("a".into()),
            Row::Value("b".into()),
            Row::Value("c".into()),
        ])
    );
}

#[test]
fn test_index_added_after_plain_load_covers_old_rows() {
    let dir = tempdir().unwrap();
    let first = write_load_file(dir.path(), "a.del", &["1,'a'", "2,'b'"]);
    let second = write_load_file(dir.path(), "b.del", &["3,'c'"]);
    let engine = Engine::new(dir.path());

    engine.load("t", &first, false).unwrap();
    engine.load("t", &second, true).unwrap();

    let conds = [SelCond::key(Comparator::Ge, 0)];
    assert_eq!(
        engine.select(Projection::Count, "t", &conds).unwrap(),
        SelectOutput::Count(3)
    );
    assert_eq!(
        engine.select(Projection::Key, "t", &conds).unwrap(),
        SelectOutput::Rows(vec![Row::Key(1), Row::Key(2), Row::Key(3)])
    );
}

#[test]
fn test_plain_load_keeps_existing_index_current() {
    let dir = tempdir().unwrap();
    let first = write_load_file(dir.path(), "a.del", &["10,'x'", "20,'y'"]);
    let second = write_load_file(dir.path(), "b.del", &["15,'z'"]);
    let engine = Engine::new(dir.path());

    engine.load("t", &first, true).unwrap();
    engine.load("t", &second, false).unwrap();

    let out = engine
        .select(Projection::Value, "t", &[SelCond::key(Comparator::Gt, 10)])
        .unwrap();
    assert_eq!(
        out,
        SelectOutput::Rows(vec![Row::Value("z".into()), Row::Value("y".into())])
    );
}

#[test]
fn test_repeated_keys_match_full_scan() {
    let lines = ["1,'a'", "5,'x'", "5,'x'", "5,'x'", "5,'x'", "5,'x'", "5,'x'", "5,'x'", "9,'z'"];
    let dir = tempdir().unwrap();
    let load = write_load_file(dir.path(), "dup.del", &lines);
    let engine = Engine::with_index_config(dir.path(), BTreeConfig::new(2, 2));
    engine.load("plain", &load, false).unwrap();
    engine.load("indexed", &load, true).unwrap();

    for conds in [
        vec![SelCond::key(Comparator::Eq, 5)],
        vec![SelCond::key(Comparator::Ge, 5)],
        vec![SelCond::key(Comparator::Le, 5)],
    ] {
        let (plain, indexed) = both(&engine, Projection::All, &conds);
        assert_eq!(sorted_rows(plain), sorted_rows(indexed), "{:?}", conds);
    }

    let (plain, indexed) = both(&engine, Projection::Count, &[SelCond::key(Comparator::Eq, 5)]);
    assert_eq!(plain, SelectOutput::Count(7));
    assert_eq!(indexed, SelectOutput::Count(7));
}

#[test]
fn test_invalid_line_stops_load() {
    let dir = tempdir().unwrap();
    let load = write_load_file(dir.path(), "bad.del", &["1,'a'", "2,'b'", "no comma here"]);
    let engine = Engine::new(dir.path());

    assert!(matches!(
        engine.load("t", &load, true),
        Err(Error::InvalidFileFormat { line: 3 })
    ));
    assert_eq!(
        engine.select(Projection::Count, "t", &[]).unwrap(),
        SelectOutput::Count(2)
    );
}

#[test]
fn test_missing_load_file() {
    let dir = tempdir().unwrap();
    let engine = Engine::new(dir.path());
    assert!(matches!(
        engine.load("t", dir.path().join("nope.del"), false),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_select_missing_table() {
    let dir = tempdir().unwrap();
    let engine = Engine::new(dir.path());
    assert!(matches!(
        engine.select(Projection::All, "ghost", &[]),
        Err(Error::TableNotFound(_))
    ));
}
