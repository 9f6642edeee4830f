//! End-to-end runs of the loader and inspector against store files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use recordstore::{Inspector, LoadOptions, Loader, Record, Store};
use tempfile::TempDir;

const HEADER: &str = "o,f,l,v,p,a,s,t,vo,ci\n";

fn write_input(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("database.csv");
    fs::write(&path, format!("{HEADER}{body}")).unwrap();
    path
}

fn load(input: &Path, store_path: &Path) -> recordstore::LoadReport {
    let loader = Loader::new(LoadOptions::default()).unwrap();
    let mut store = Store::open(store_path).unwrap();
    let report = loader.load(input, &mut store).unwrap();
    store.close().unwrap();
    report
}

fn count(store_path: &Path) -> usize {
    let store = Store::open_existing(store_path).unwrap();
    store.count().unwrap()
}

fn well_formed_rows(n: usize) -> String {
    (0..n)
        .map(|i| format!("o{i},f{i},l{i},v{i},p{i},a{i},s{i},t{i},vo{i},ci{i}\n"))
        .collect()
}

#[test]
fn example_row_is_stored_and_printed() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "'Acme','Jane','Doe','v1','p1','a1','s1','t1','vo1','ci1'\n");
    let db = dir.path().join("records.db");

    let report = load(&input, &db);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.rejected, 0);

    let store = Store::open_existing(&db).unwrap();
    let expected =
        Record::from_values(["Acme", "Jane", "Doe", "v1", "p1", "a1", "s1", "t1", "vo1", "ci1"]).unwrap();
    assert_eq!(store.fetch(10).unwrap(), vec![expected]);

    let mut out = Vec::new();
    Inspector::new(10).print(&store, &mut out).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Record 1: ('Acme', 'Jane', 'Doe', 'v1', 'p1', 'a1', 's1', 't1', 'vo1', 'ci1')\n"
    );
}

#[test]
fn row_count_matches_data_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, &well_formed_rows(37));
    let db = dir.path().join("records.db");

    assert_eq!(load(&input, &db).inserted, 37);
    assert_eq!(count(&db), 37);
}

#[test]
fn malformed_rows_are_dropped_locally() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "{}too,few\n{}a,b,c,d,e,f,g,h,i,j,k\n",
        well_formed_rows(2),
        well_formed_rows(1)
    );
    let input = write_input(&dir, &body);
    let db = dir.path().join("records.db");

    let report = load(&input, &db);
    assert_eq!(report.inserted, 3);
    assert_eq!(report.rejected, 2);
    assert_eq!(count(&db), 3);

    let store = Store::open_existing(&db).unwrap();
    assert!(store.fetch(10).unwrap().iter().all(|r| r.get("o").unwrap().starts_with('o')));
}

#[test]
fn loading_twice_replaces_rather_than_appends() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, &well_formed_rows(5));
    let db = dir.path().join("records.db");

    load(&input, &db);
    load(&input, &db);
    assert_eq!(count(&db), 5);
}

#[test]
fn header_only_file_empties_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.db");
    let full = write_input(&dir, &well_formed_rows(4));
    load(&full, &db);
    assert_eq!(count(&db), 4);

    let empty = write_input(&dir, "");
    assert_eq!(load(&empty, &db).inserted, 0);
    assert_eq!(count(&db), 0);
}

#[test]
fn values_round_trip_in_field_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "' spaced ',\"dq\",'it''s','',é,5,'a,b',t,vo,ci\n");
    let db = dir.path().join("records.db");
    load(&input, &db);

    let store = Store::open_existing(&db).unwrap();
    let rows = store.fetch(1).unwrap();
    assert_eq!(
        rows[0].fields(),
        &[" spaced ", "\"dq\"", "it's", "", "é", "5", "a,b", "t", "vo", "ci"].map(String::from)
    );
}

#[test]
fn inspector_prints_at_most_ten() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, &well_formed_rows(15));
    let db = dir.path().join("records.db");
    load(&input, &db);

    let store = Store::open_existing(&db).unwrap();
    let mut out = Vec::new();
    assert_eq!(Inspector::new(10).print(&store, &mut out).unwrap(), 10);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 10);
    assert!(text.lines().last().unwrap().starts_with("Record 10: "));
}

#[test]
fn missing_input_fails_and_keeps_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("records.db");
    let input = write_input(&dir, &well_formed_rows(2));
    load(&input, &db);

    let loader = Loader::new(LoadOptions::default()).unwrap();
    let mut store = Store::open(&db).unwrap();
    let err = loader.load(&dir.path().join("absent.csv"), &mut store).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"));
    store.close().unwrap();
    assert_eq!(count(&db), 2);
}

#[test]
fn inspecting_missing_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Store::open_existing(dir.path().join("records.db")).is_err());
}

#[test]
fn inspecting_store_without_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("other.db");
    // a zero-length file is a valid, empty SQLite database
    fs::write(&db, b"").unwrap();

    let store = Store::open_existing(&db).unwrap();
    assert!(Inspector::new(10).sample(&store).is_err());
}
