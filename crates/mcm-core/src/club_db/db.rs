//! SQLite-backed club database: connection, schema and timestamp helpers.
//!
//! Entity CRUD lives in the sibling modules (`members`, `documents`, ...).

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

// `target_member_id` is not a foreign key: removing a member leaves the
// target dangling, and statistics report it as orphaned.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        joined_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS member_roles (
        member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        PRIMARY KEY (member_id, role)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS motorcycles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
        brand TEXT NOT NULL,
        model TEXT NOT NULL,
        year INTEGER,
        plate TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        location TEXT,
        starts_at INTEGER NOT NULL,
        description TEXT,
        published INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        target_mode TEXT NOT NULL,
        target_role TEXT,
        target_member_id INTEGER,
        published INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_access (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
        accessed_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS document_access_by_document
        ON document_access (document_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS polls (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question TEXT NOT NULL,
        options_json TEXT NOT NULL,
        target_mode TEXT NOT NULL,
        target_role TEXT,
        target_member_id INTEGER,
        open INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS poll_votes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        poll_id INTEGER NOT NULL REFERENCES polls(id) ON DELETE CASCADE,
        member_id INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
        option_index INTEGER NOT NULL,
        voted_at INTEGER NOT NULL,
        UNIQUE (poll_id, member_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cash_flows (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        kind TEXT NOT NULL,
        amount_cents INTEGER NOT NULL,
        label TEXT NOT NULL,
        category TEXT,
        occurred_at INTEGER NOT NULL
    )
    "#,
];

/// Handle to the SQLite-backed club database.
///
/// Cheap to clone; pass it to whatever needs persistence. The default file
/// lives under the XDG state directory: `~/.local/state/mcm/club.db`.
#[derive(Clone)]
pub struct ClubDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl ClubDb {
    /// Path of the default database file.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("mcm")?;
        Ok(xdg_dirs.get_state_home().join("club.db"))
    }

    /// Open (or create) the default club database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        let db = ClubDb { pool };
        db.migrate().await?;
        tracing::debug!(path = %path.display(), "club database ready");
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(*stmt).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Current time as Unix seconds (for DB timestamps).
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Open an in-memory database (no disk I/O). Used by unit tests across the crate.
#[cfg(test)]
pub(crate) async fn open_memory() -> Result<ClubDb> {
    // Single connection so the pool never hands back a different empty DB.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = ClubDb { pool };
    db.migrate().await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_escapes_special_chars() {
        let uri = path_to_sqlite_uri(Path::new("/tmp/my club#1/club.db"));
        assert_eq!(uri, "sqlite:///tmp/my%20club%231/club.db");
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let db = open_memory().await.unwrap();
        db.migrate().await.unwrap();
    }
}
