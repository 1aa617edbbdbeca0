// Stockroom - SQLite persistence
// One process-wide handle wraps a single connection. Handlers never open
// connections themselves; they go through the global handle, which is bound
// exactly once and rejects re-binding to a different file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::OnceCell;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::entities::{EntityKind, Material, NamedEntity, User};
use crate::error::StoreError;
use crate::schema::{check_in_clause, Role, UnitOfMeasure};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static DATABASE: OnceCell<Database> = OnceCell::new();

// ============================================================================
// Connection handle
// ============================================================================

/// Shared handle over the single SQLite connection.
///
/// Clones share the connection. The query timeout bounds how long async
/// callers wait for the blocking pool before reporting the store unavailable.
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
    query_timeout: Duration,
}

impl Database {
    /// Open a file-backed database, applying pragmas and schema.
    pub fn open(path: impl AsRef<Path>, query_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(open_failure)?;
        Self::bootstrap(conn, Some(path.to_path_buf()), query_timeout)
    }

    /// In-memory database with the same pragmas and schema. Test use mostly.
    pub fn open_in_memory(query_timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(open_failure)?;
        Self::bootstrap(conn, None, query_timeout)
    }

    fn bootstrap(
        mut conn: Connection,
        path: Option<PathBuf>,
        query_timeout: Duration,
    ) -> Result<Self, StoreError> {
        configure(&mut conn).map_err(open_failure)?;
        setup_schema(&conn).map_err(open_failure)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
            path,
            query_timeout,
        })
    }

    /// Bind the process-wide handle to the configured database file.
    ///
    /// The first call opens the database; later calls with the same path get
    /// the existing handle back. A call with a different path is refused, the
    /// handle never rebinds.
    pub fn global_init(config: &Config) -> Result<&'static Database, StoreError> {
        let db =
            DATABASE.get_or_try_init(|| Database::open(&config.db_path, config.query_timeout()))?;
        if db.path.as_deref() == Some(config.db_path.as_path()) {
            Ok(db)
        } else {
            Err(StoreError::Unavailable(format!(
                "database handle already initialized with a different path (requested {})",
                config.db_path.display()
            )))
        }
    }

    /// The process-wide handle, or `Unavailable` if nothing bound it yet.
    pub fn global() -> Result<&'static Database, StoreError> {
        DATABASE
            .get()
            .ok_or_else(|| StoreError::Unavailable("database handle not initialized".to_string()))
    }

    /// Run a closure against the connection under the lock.
    pub fn with_conn<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
        op(&conn)
    }
}

#[cfg(feature = "server")]
impl Database {
    /// Move a query onto the blocking pool and wait at most `query_timeout`.
    ///
    /// A query that overruns the timeout is reported as `Unavailable`; the
    /// blocking task itself is left to finish in the background.
    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db = self.clone();
        let task = tokio::task::spawn_blocking(move || db.with_conn(op));
        match tokio::time::timeout(self.query_timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => Err(StoreError::Unavailable(format!(
                "query task failed: {join_err}"
            ))),
            Err(_) => Err(StoreError::Unavailable(format!(
                "query timed out after {:?}",
                self.query_timeout
            ))),
        }
    }

    pub async fn list_all(&self, kind: EntityKind) -> Result<Vec<NamedEntity>, StoreError> {
        self.run(move |conn| list_entities(conn, kind)).await
    }

    pub async fn list_materials(&self) -> Result<Vec<Material>, StoreError> {
        self.run(list_materials).await
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let username = username.to_string();
        self.run(move |conn| find_user_by_username(conn, &username))
            .await
    }
}

fn configure(conn: &mut Connection) -> rusqlite::Result<()> {
    // WAL for crash recovery, same as every other deployment of this schema
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if cfg!(debug_assertions) {
        conn.trace(Some(trace_sql));
    }
    Ok(())
}

fn trace_sql(sql: &str) {
    debug!(target: "stockroom::sql", "{sql}");
}

fn open_failure(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(format!("cannot open database: {err}"))
}

// ============================================================================
// Schema
// ============================================================================

/// Create all tables if missing. Enumeration columns carry CHECK constraints
/// derived from the enum declarations, so schema and listing cannot drift.
pub fn setup_schema(conn: &Connection) -> rusqlite::Result<()> {
    for kind in EntityKind::ALL {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
                )",
                kind.table()
            ),
            [],
        )?;
    }

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS materials (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                unit TEXT NOT NULL {},
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            check_in_clause("unit", &UnitOfMeasure::names())
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_salt TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL {},
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            check_in_clause("role", &Role::names())
        ),
        [],
    )?;

    Ok(())
}

// ============================================================================
// Queries
// ============================================================================

pub fn list_entities(conn: &Connection, kind: EntityKind) -> Result<Vec<NamedEntity>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT id, name FROM {}", kind.table()))?;
    let entities = stmt
        .query_map([], |row| {
            Ok(NamedEntity {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entities)
}

pub fn insert_entity(
    conn: &Connection,
    kind: EntityKind,
    entity: &NamedEntity,
) -> Result<(), StoreError> {
    conn.execute(
        &format!("INSERT INTO {} (id, name) VALUES (?1, ?2)", kind.table()),
        params![entity.id, entity.name],
    )?;
    Ok(())
}

/// Total rows across all named-entity tables.
pub fn entity_count(conn: &Connection) -> Result<i64, StoreError> {
    let mut total = 0;
    for kind in EntityKind::ALL {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        total += count;
    }
    Ok(total)
}

pub fn list_materials(conn: &Connection) -> Result<Vec<Material>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name, unit FROM materials")?;
    let materials = stmt
        .query_map([], |row| {
            Ok(Material {
                id: row.get(0)?,
                name: row.get(1)?,
                unit: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(materials)
}

pub fn insert_material(conn: &Connection, material: &Material) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO materials (id, name, unit) VALUES (?1, ?2, ?3)",
        params![material.id, material.name, material.unit.as_str()],
    )?;
    Ok(())
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO users (id, username, password_salt, password_hash, role)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.username,
            user.password_salt,
            user.password_hash,
            user.role.as_str(),
        ],
    )?;
    Ok(())
}

pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            "SELECT id, username, password_salt, password_hash, role
             FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_salt: row.get(2)?,
                    password_hash: row.get(3)?,
                    role: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

// ============================================================================
// CSV import
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Insert a batch of named entities, skipping rows whose name already exists
/// in the target table. Re-running the same import is a no-op.
pub fn insert_entities(
    conn: &Connection,
    batch: &[(EntityKind, NamedEntity)],
) -> Result<ImportSummary, StoreError> {
    let mut summary = ImportSummary {
        inserted: 0,
        skipped: 0,
    };

    for (kind, entity) in batch {
        let existing: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE name = ?1", kind.table()),
            [entity.name.as_str()],
            |row| row.get(0),
        )?;
        if existing > 0 {
            summary.skipped += 1;
            continue;
        }
        insert_entity(conn, *kind, entity)?;
        summary.inserted += 1;
    }

    Ok(summary)
}

#[derive(Debug, Deserialize)]
struct CsvEntityRow {
    kind: String,
    name: String,
}

/// Read a `kind,name` CSV into insertable entities with fresh identities.
pub fn load_entities_csv(csv_path: &Path) -> anyhow::Result<Vec<(EntityKind, NamedEntity)>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut batch = Vec::new();
    for result in rdr.deserialize() {
        let row: CsvEntityRow = result.context("Failed to deserialize entity row")?;
        let kind = EntityKind::parse(&row.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown entity kind `{}`", row.kind))?;
        batch.push((kind, NamedEntity::new(row.name)));
    }

    Ok(batch)
}
