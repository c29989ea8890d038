use rusqlite::Connection;
use territory_core::db::migrations::latest_version;
use territory_core::db::open_db_in_memory;
use territory_core::{
    NewTerritory, RepoError, SqliteTerritoryRepository, TerritoryRepository, UniqueKey,
};

fn batch(rows: &[(&str, &str, &str)]) -> Vec<NewTerritory> {
    rows.iter()
        .map(|(code, name, region)| NewTerritory::new(code, name, region))
        .collect()
}

fn row_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM territories;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn insert_and_fetch_by_region_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();

    let created = repo
        .insert_many(&batch(&[
            ("TB", "Bay", "AB"),
            ("TA", "Alpha", "AB"),
            ("TC", "Cape", "CD"),
        ]))
        .unwrap();
    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|row| row.created_at > 0));

    let region_ab = repo.fetch_by_region("ab").unwrap();
    let codes: Vec<_> = region_ab.iter().map(|row| row.code.as_str()).collect();
    assert_eq!(codes, vec!["TA", "TB"]);
}

#[test]
fn insert_many_rolls_back_whole_batch_on_duplicate_code() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();
        repo.insert_many(&batch(&[("TA", "Alpha", "AB")])).unwrap();

        let err = repo
            .insert_many(&batch(&[("TB", "Bay", "AB"), ("ta", "Other", "ab")]))
            .unwrap_err();
        match err {
            RepoError::UniqueViolation { key, detail } => {
                assert_eq!(key, UniqueKey::Code);
                assert_eq!(detail, "Code=ta, Region=ab");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(row_count(&conn), 1);
}

#[test]
fn insert_many_reports_duplicate_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();
    repo.insert_many(&batch(&[("TA", "Alpha", "AB")])).unwrap();

    let err = repo
        .insert_many(&batch(&[("TZ", "ALPHA", "AB")]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::UniqueViolation {
            key: UniqueKey::Name,
            ..
        }
    ));
}

#[test]
fn same_code_is_allowed_in_different_regions() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();

    let created = repo
        .insert_many(&batch(&[("TA", "Alpha", "AB"), ("TA", "Alpha", "CD")]))
        .unwrap();
    assert_eq!(created.len(), 2);
}

#[test]
fn update_many_returns_only_matched_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();
    repo.insert_many(&batch(&[("AA", "Old", "US")])).unwrap();

    let updated = repo
        .update_many(&batch(&[("AA", "New", "US"), ("ZZ", "Ghost", "US")]))
        .unwrap();

    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].code, "AA");
    assert_eq!(updated[0].name, "New");
    assert!(updated[0].updated_at >= updated[0].created_at);
    assert_eq!(repo.fetch_by_region("US").unwrap()[0].name, "New");
}

#[test]
fn update_many_does_not_touch_same_code_in_other_region() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();
    repo.insert_many(&batch(&[("AA", "First", "US"), ("AA", "Second", "EU")]))
        .unwrap();

    repo.update_many(&batch(&[("AA", "Renamed", "US")])).unwrap();

    assert_eq!(repo.fetch_by_region("EU").unwrap()[0].name, "Second");
}

#[test]
fn update_many_rolls_back_on_name_collision() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();
    repo.insert_many(&batch(&[("AA", "Alpha", "US"), ("BB", "Bravo", "US")]))
        .unwrap();

    let err = repo
        .update_many(&batch(&[("AA", "Changed", "US"), ("BB", "changed", "US")]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::UniqueViolation {
            key: UniqueKey::Name,
            ..
        }
    ));

    let names: Vec<_> = repo
        .fetch_by_region("US")
        .unwrap()
        .into_iter()
        .map(|row| row.name)
        .collect();
    assert_eq!(names, vec!["Alpha".to_string(), "Bravo".to_string()]);
}

#[test]
fn delete_many_by_codes_counts_removed_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();
    repo.insert_many(&batch(&[("AB", "Alpha", "US"), ("EF", "Echo", "US")]))
        .unwrap();

    let deleted = repo
        .delete_many_by_codes(&["ab".to_string(), "CD".to_string(), " ".to_string()])
        .unwrap();
    assert_eq!(deleted, 1);

    assert_eq!(repo.delete_many_by_codes(&[]).unwrap(), 0);
    assert_eq!(repo.fetch_by_region("US").unwrap().len(), 1);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result = SqliteTerritoryRepository::try_new(&mut conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_territories_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTerritoryRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("territories"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE territories (
            id TEXT PRIMARY KEY NOT NULL,
            code TEXT NOT NULL,
            name TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTerritoryRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "territories",
            column: "region_code"
        })
    ));
}

#[test]
fn fetch_rejects_corrupt_row_id() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO territories (id, code, name, region_code) VALUES ('not-a-uuid', 'TA', 'Alpha', 'AB');",
        [],
    )
    .unwrap();

    let repo = SqliteTerritoryRepository::try_new(&mut conn).unwrap();
    let err = repo.fetch_by_region("AB").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
