/// Disk persistence layer backed by redb.
///
/// Uses a single redb database file with two tables:
/// - `versions`: the whole version list as a JSON array, keyed by storage key
/// - `meta`: bincode-serialized `StoreMeta` for the same key
///
/// Every save rewrites both entries in one transaction. There are no partial
/// or incremental writes.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::version::VersionList;

/// Version table: storage key → JSON array of versions.
const VERSIONS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("versions");

/// Metadata table: storage key → bincode-serialized StoreMeta.
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Shape of the stored version blob. Bumped on incompatible changes;
/// blobs written under another schema are ignored on load.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata persisted alongside each version list.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StoreMeta {
    schema_version: u32,
    /// Wall-clock Unix milliseconds of the write.
    saved_at: i64,
    count: usize,
}

/// Persistence layer for version lists backed by redb.
///
/// Last writer wins: two sessions holding their own copy of a list and both
/// saving under the same key keep only the later list.
pub struct VersionStore {
    db: Database,
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore").finish()
    }
}

impl VersionStore {
    /// Opens or creates the history database in the given directory.
    ///
    /// Creates the directory and database file if they don't exist.
    /// Initializes tables on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub fn open(data_dir: &Path) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("history.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open history database: {}", db_path.display()))?;

        // Ensure tables exist
        let write_txn = db
            .begin_write()
            .context("Failed to begin initial write transaction")?;
        {
            let _ = write_txn
                .open_table(VERSIONS_TABLE)
                .context("Failed to create versions table")?;
            let _ = write_txn
                .open_table(META_TABLE)
                .context("Failed to create meta table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial transaction")?;

        Ok(Arc::new(Self { db }))
    }

    /// Overwrites the version list stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write transaction fails.
    pub fn save(&self, key: &str, list: &VersionList) -> Result<()> {
        let json = serde_json::to_string(list).context("Failed to serialize version list")?;
        let meta = StoreMeta {
            schema_version: SCHEMA_VERSION,
            saved_at: chrono::Utc::now().timestamp_millis(),
            count: list.len(),
        };
        let meta_bytes = bincode::serialize(&meta).context("Failed to serialize store metadata")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(VERSIONS_TABLE)
                .context("Failed to open versions table")?;
            table
                .insert(key, json.as_str())
                .context("Failed to insert version list")?;
        }
        {
            let mut table = write_txn
                .open_table(META_TABLE)
                .context("Failed to open meta table")?;
            table
                .insert(key, meta_bytes.as_slice())
                .context("Failed to insert store metadata")?;
        }
        write_txn
            .commit()
            .context("Failed to commit write transaction")?;

        tracing::debug!(key, count = list.len(), "Saved version list");
        Ok(())
    }

    /// Reads the version list stored under `key`.
    ///
    /// Returns `None` if nothing is stored or the stored metadata names a
    /// different schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction fails or the blob does not
    /// parse into a valid version list.
    pub fn try_load(&self, key: &str) -> Result<Option<VersionList>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let meta_table = read_txn
            .open_table(META_TABLE)
            .context("Failed to open meta table")?;
        if let Some(guard) = meta_table.get(key).context("Failed to read store metadata")? {
            let meta: StoreMeta = bincode::deserialize(guard.value())
                .context("Failed to deserialize store metadata")?;
            if meta.schema_version != SCHEMA_VERSION {
                tracing::warn!(
                    key,
                    stored = meta.schema_version,
                    expected = SCHEMA_VERSION,
                    "Ignoring version list written under another schema"
                );
                return Ok(None);
            }
        }

        let table = read_txn
            .open_table(VERSIONS_TABLE)
            .context("Failed to open versions table")?;
        match table.get(key).context("Failed to read version list")? {
            Some(guard) => {
                let list: VersionList = serde_json::from_str(guard.value())
                    .context("Failed to parse stored version list")?;
                Ok(Some(list))
            }
            None => Ok(None),
        }
    }

    /// Reads the version list stored under `key`, treating every failure as
    /// "nothing stored".
    pub fn load(&self, key: &str) -> Option<VersionList> {
        match self.try_load(key) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Discarding unreadable version history '{key}': {e:#}");
                None
            }
        }
    }

    /// Removes the version list and metadata stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails.
    pub fn delete(&self, key: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(VERSIONS_TABLE)
                .context("Failed to open versions table")?;
            let _ = table.remove(key);
        }
        {
            let mut meta_table = write_txn
                .open_table(META_TABLE)
                .context("Failed to open meta table")?;
            let _ = meta_table.remove(key);
        }
        write_txn.commit().context("Failed to commit deletion")?;
        Ok(())
    }

    /// Lists all storage keys that currently hold a version list.
    ///
    /// # Errors
    ///
    /// Returns an error if the read transaction fails.
    pub fn list_keys(&self) -> Result<Vec<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(VERSIONS_TABLE)
            .context("Failed to open versions table")?;

        let mut keys = Vec::new();
        for entry in table.iter().context("Failed to iterate versions table")? {
            let (key_guard, _) = entry.context("Failed to read versions entry")?;
            keys.push(key_guard.value().to_string());
        }
        Ok(keys)
    }

    /// Writes a raw blob under `key`, bypassing validation.
    #[cfg(test)]
    pub(crate) fn write_raw(&self, key: &str, blob: &str, schema_version: u32) -> Result<()> {
        let meta = StoreMeta {
            schema_version,
            saved_at: 0,
            count: 0,
        };
        let meta_bytes = bincode::serialize(&meta)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(VERSIONS_TABLE)?;
            table.insert(key, blob)?;
            let mut meta_table = write_txn.open_table(META_TABLE)?;
            meta_table.insert(key, meta_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use tempfile::TempDir;

    const KEY: &str = "editor-versions";

    fn open_test_db() -> (Arc<VersionStore>, TempDir) {
        let dir = TempDir::new().expect("create temp dir");
        let store = VersionStore::open(dir.path()).expect("open db");
        (store, dir)
    }

    fn sample_list() -> VersionList {
        let mut restored = Version::new("v2", "<p>A</p>", 3_000);
        restored.restored_from = Some(crate::version::VersionRef {
            id: "initial".to_string(),
            timestamp: 1_000,
        });
        VersionList::from_versions(vec![
            Version::new("initial", "<p>A</p>", 1_000),
            Version::new("v1", "<p>B</p>", 2_000),
            restored,
        ])
        .expect("valid list")
    }

    #[test]
    fn test_open_creates_database() {
        let (store, dir) = open_test_db();
        assert!(dir.path().join("history.redb").exists());
        assert!(store.list_keys().expect("list").is_empty());
    }

    #[test]
    fn test_load_missing_is_none() {
        let (store, _dir) = open_test_db();
        assert!(store.try_load(KEY).expect("load").is_none());
        assert!(store.load(KEY).is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (store, _dir) = open_test_db();
        let list = sample_list();
        store.save(KEY, &list).expect("save");

        let loaded = store.load(KEY).expect("stored list");
        assert_eq!(loaded, list);
    }

    #[test]
    fn test_save_overwrites_whole_list() {
        let (store, _dir) = open_test_db();
        store.save(KEY, &sample_list()).expect("save");

        let shorter = VersionList::seeded(Version::new("only", "<p>X</p>", 9));
        store.save(KEY, &shorter).expect("overwrite");

        let loaded = store.load(KEY).expect("stored list");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.latest().id, "only");
    }

    #[test]
    fn test_corrupt_blob_treated_as_absent() {
        let (store, _dir) = open_test_db();
        store
            .write_raw(KEY, "{not json", SCHEMA_VERSION)
            .expect("write raw");

        assert!(store.try_load(KEY).is_err());
        assert!(store.load(KEY).is_none());
    }

    #[test]
    fn test_invalid_list_treated_as_absent() {
        let (store, _dir) = open_test_db();
        let dup = r#"[{"id":"a","content":"1","timestamp":1},{"id":"a","content":"2","timestamp":2}]"#;
        store.write_raw(KEY, dup, SCHEMA_VERSION).expect("write raw");
        assert!(store.load(KEY).is_none());

        store.write_raw(KEY, "[]", SCHEMA_VERSION).expect("write raw");
        assert!(store.load(KEY).is_none());
    }

    #[test]
    fn test_other_schema_version_ignored() {
        let (store, _dir) = open_test_db();
        let json = serde_json::to_string(&sample_list()).expect("serialize");
        store
            .write_raw(KEY, &json, SCHEMA_VERSION + 1)
            .expect("write raw");

        assert!(store.try_load(KEY).expect("load").is_none());
    }

    #[test]
    fn test_delete() {
        let (store, _dir) = open_test_db();
        store.save(KEY, &sample_list()).expect("save");
        store.delete(KEY).expect("delete");
        assert!(store.load(KEY).is_none());
        assert!(store.list_keys().expect("list").is_empty());
    }

    #[test]
    fn test_keys_are_isolated() {
        let (store, _dir) = open_test_db();
        store.save("doc-a", &sample_list()).expect("save a");
        store
            .save("doc-b", &VersionList::seeded(Version::new("b", "<p>b</p>", 1)))
            .expect("save b");

        assert_eq!(store.load("doc-a").expect("a").len(), 3);
        assert_eq!(store.load("doc-b").expect("b").len(), 1);

        let mut keys = store.list_keys().expect("list");
        keys.sort();
        assert_eq!(keys, vec!["doc-a", "doc-b"]);
    }

    #[test]
    fn test_reopen_database_preserves_data() {
        let dir = TempDir::new().expect("create temp dir");

        {
            let store = VersionStore::open(dir.path()).expect("open");
            store.save(KEY, &sample_list()).expect("save");
        }

        {
            let store = VersionStore::open(dir.path()).expect("reopen");
            let loaded = store.load(KEY).expect("stored list");
            assert_eq!(loaded, sample_list());
        }
    }
}
