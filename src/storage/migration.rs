//! One-time import of the legacy JSON entry list.
//!
//! Older builds kept entries as a single JSON array. On first load the array
//! is copied into the database and the file is removed. Imported entries are
//! not queued for sync.

use std::path::Path;

use crate::budget::BudgetEntry;
use crate::db::Database;
use crate::error::Result;
use crate::storage::put_entry;

/// Import entries from `path` if it holds a non-empty JSON array.
///
/// Never fails: anything unreadable is logged and treated as "nothing to
/// migrate", leaving the file in place.
pub fn migrate_from_legacy(db: &Database, path: &Path) -> Vec<BudgetEntry> {
    match try_migrate(db, path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Legacy migration from {} failed: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn try_migrate(db: &Database, path: &Path) -> Result<Vec<BudgetEntry>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let is_non_empty_array = parsed.as_array().is_some_and(|items| !items.is_empty());
    if !is_non_empty_array {
        return Ok(Vec::new());
    }
    let entries: Vec<BudgetEntry> = serde_json::from_value(parsed)?;

    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        for entry in &entries {
            put_entry(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    })?;

    std::fs::remove_file(path)?;
    tracing::info!(
        "Migrated {} legacy entries from {}",
        entries.len(),
        path.display()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{get_all_entries, queue::queue_len};

    const LEGACY: &str = r#"[
        {"id":"1700000000000-abc1234","amount":2000,"description":"salary","type":"income","createdAt":"2023-11-14T22:13:20.000Z"},
        {"id":"1700000000001-def5678","amount":45.5,"description":"","type":"expense","createdAt":"2023-11-14T22:13:21.000Z"}
    ]"#;

    #[test]
    fn test_migrates_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgeto_entries.json");
        std::fs::write(&path, LEGACY).unwrap();
        let db = Database::open_in_memory().unwrap();

        let migrated = migrate_from_legacy(&db, &path);
        assert_eq!(migrated.len(), 2);
        assert!(!path.exists());
        assert_eq!(get_all_entries(&db).unwrap(), migrated);
        assert_eq!(queue_len(&db).unwrap(), 0);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        assert!(migrate_from_legacy(&db, &dir.path().join("none.json")).is_empty());
    }

    #[test]
    fn test_empty_array_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgeto_entries.json");
        std::fs::write(&path, "[]").unwrap();
        let db = Database::open_in_memory().unwrap();

        assert!(migrate_from_legacy(&db, &path).is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_garbage_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgeto_entries.json");
        std::fs::write(&path, "{not json").unwrap();
        let db = Database::open_in_memory().unwrap();

        assert!(migrate_from_legacy(&db, &path).is_empty());
        assert!(path.exists());
        assert!(get_all_entries(&db).unwrap().is_empty());
    }

    #[test]
    fn test_non_array_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgeto_entries.json");
        std::fs::write(&path, r#"{"id":"x"}"#).unwrap();
        let db = Database::open_in_memory().unwrap();

        assert!(migrate_from_legacy(&db, &path).is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_empty_file_left_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budgeto_entries.json");
        std::fs::write(&path, "").unwrap();
        let db = Database::open_in_memory().unwrap();

        assert!(migrate_from_legacy(&db, &path).is_empty());
        assert!(path.exists());
        assert!(get_all_entries(&db).unwrap().is_empty());
    }
}
