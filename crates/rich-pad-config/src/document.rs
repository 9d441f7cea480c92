/// Document slot: the latest saved document, kept apart from the history.
///
/// Stored as raw `&str` in a redb table keyed by slot name. The editor reads
/// it once at startup and overwrites it every time a save completes.
use std::path::Path;

use anyhow::{Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

/// Document table: slot key → markup.
const DOCUMENTS: TableDefinition<&str, &str> = TableDefinition::new("documents");

/// Persistence layer for the saved document, backed by redb.
pub struct DocumentStore {
    db: Database,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish()
    }
}

impl DocumentStore {
    /// Opens or creates the document database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let db = Database::create(path)
            .with_context(|| format!("Failed to open document database: {}", path.display()))?;

        // Ensure table exists
        let write_txn = db
            .begin_write()
            .context("Failed to begin initial document write transaction")?;
        {
            let _ = write_txn
                .open_table(DOCUMENTS)
                .context("Failed to create documents table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial document transaction")?;

        Ok(Self { db })
    }

    /// Overwrites the document stored under `key`.
    pub fn save(&self, key: &str, content: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(DOCUMENTS)
                .context("Failed to open documents table")?;
            table
                .insert(key, content)
                .context("Failed to insert document")?;
        }
        write_txn.commit().context("Failed to commit document")?;
        Ok(())
    }

    /// Loads the document stored under `key`, or `None` if not found.
    pub fn load(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(DOCUMENTS)
            .context("Failed to open documents table")?;

        match table.get(key).context("Failed to read document")? {
            Some(guard) => Ok(Some(guard.value().to_string())),
            None => Ok(None),
        }
    }

    /// Deletes the document stored under `key`.
    pub fn delete(&self, key: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(DOCUMENTS)
                .context("Failed to open documents table")?;
            let _ = table.remove(key);
        }
        write_txn
            .commit()
            .context("Failed to commit document deletion")?;
        Ok(())
    }
}
