use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lifetime of a stored key.
///
/// `Device` rows live in the database file. `Session` rows live in a TEMP
/// table and disappear when the connection closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    Session,
    #[default]
    Device,
}

impl StorageScope {
    fn table(&self) -> &'static str {
        match self {
            StorageScope::Session => "temp.session_storage",
            StorageScope::Device => "local_storage",
        }
    }
}

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.create_session_table()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.create_session_table()?;
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn default_path() -> PathBuf {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobboard") {
            proj_dirs.data_dir().join("jobboard.db")
        } else {
            PathBuf::from("jobboard.db")
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn create_session_table(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TEMP TABLE IF NOT EXISTS session_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='local_storage'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'jobboard init' first."
            ));
        }
        Ok(())
    }

    // --- Key-value operations ---

    pub fn get_item(&self, scope: StorageScope, key: &str) -> Result<Option<String>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?1", scope.table());
        self.conn
            .query_row(&sql, [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read '{}'", key))
    }

    pub fn set_item(&self, scope: StorageScope, key: &str, value: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            scope.table()
        );
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .execute(&sql, params![key, value, now])
            .with_context(|| format!("Failed to write '{}'", key))?;
        Ok(())
    }

    pub fn remove_item(&self, scope: StorageScope, key: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", scope.table());
        self.conn.execute(&sql, [key])?;
        Ok(())
    }

    pub fn clear(&self, scope: StorageScope) -> Result<()> {
        let sql = format!("DELETE FROM {}", scope.table());
        self.conn.execute(&sql, [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(StorageScope::Device, "k", "1").unwrap();
        db.set_item(StorageScope::Device, "k", "2").unwrap();
        assert_eq!(db.get_item(StorageScope::Device, "k").unwrap().as_deref(), Some("2"));
        assert_eq!(db.get_item(StorageScope::Device, "missing").unwrap(), None);
    }

    #[test]
    fn scopes_are_independent() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(StorageScope::Session, "k", "session").unwrap();
        assert_eq!(db.get_item(StorageScope::Device, "k").unwrap(), None);
        db.remove_item(StorageScope::Session, "k").unwrap();
        assert_eq!(db.get_item(StorageScope::Session, "k").unwrap(), None);
    }

    #[test]
    fn clear_only_touches_its_scope() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(StorageScope::Device, "a", "1").unwrap();
        db.set_item(StorageScope::Device, "b", "2").unwrap();
        db.set_item(StorageScope::Session, "a", "3").unwrap();
        db.clear(StorageScope::Device).unwrap();
        assert_eq!(db.get_item(StorageScope::Device, "a").unwrap(), None);
        assert_eq!(db.get_item(StorageScope::Device, "b").unwrap(), None);
        assert_eq!(db.get_item(StorageScope::Session, "a").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn session_scope_does_not_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        {
            let db = Database::open(&path).unwrap();
            db.init().unwrap();
            db.set_item(StorageScope::Session, "applied", "[1]").unwrap();
            db.set_item(StorageScope::Device, "saved", "[2]").unwrap();
        }
        let db = Database::open(&path).unwrap();
        db.ensure_initialized().unwrap();
        assert_eq!(db.get_item(StorageScope::Session, "applied").unwrap(), None);
        assert_eq!(db.get_item(StorageScope::Device, "saved").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn uninitialized_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("fresh.db")).unwrap();
        assert!(db.ensure_initialized().is_err());
    }
}
