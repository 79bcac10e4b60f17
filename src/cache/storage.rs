//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::net::{Request, Response};

/// A response read back from a bucket.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  /// The stored response snapshot
  pub response: Response,
  /// When the response was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Buckets are named request→response stores. Only GET requests are ever
/// matched; each call is atomic on its own.
pub trait CacheStorage: Send + Sync {
  /// Create the bucket if it does not exist yet.
  fn open_bucket(&self, name: &str) -> Result<()>;

  /// Whether a bucket with this name exists.
  fn has_bucket(&self, name: &str) -> Result<bool>;

  /// All bucket names, oldest first.
  fn bucket_names(&self) -> Result<Vec<String>>;

  /// Delete a bucket and its entries. Returns false if it was already gone.
  fn delete_bucket(&self, name: &str) -> Result<bool>;

  /// Store one response, replacing any previous entry for the request.
  fn put(&self, bucket: &str, request: &Request, response: &Response) -> Result<()>;

  /// Store several responses in one transaction: all are written or none.
  fn put_all(&self, bucket: &str, entries: &[(Request, Response)]) -> Result<()>;

  /// Look up the stored response for a request.
  fn match_request(&self, bucket: &str, request: &Request) -> Result<Option<CachedResponse>>;

  /// Cache keys (URLs) stored in a bucket, in insertion order.
  fn keys(&self, bucket: &str) -> Result<Vec<String>>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the storage at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
          .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
      }
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open the storage at the default location.
  pub fn open_default() -> Result<Self> {
    Self::open(&Self::default_path()?)
  }

  /// Open a throwaway in-memory storage.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::with_connection(conn)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("sw-cache").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    self
      .lock()?
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Named buckets; id preserves creation order
CREATE TABLE IF NOT EXISTS buckets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One stored response per (bucket, url)
CREATE TABLE IF NOT EXISTS entries (
    bucket TEXT NOT NULL,
    url TEXT NOT NULL,
    meta TEXT NOT NULL,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (bucket, url)
);
"#;

fn ensure_bucket(conn: &Connection, name: &str) -> Result<()> {
  conn
    .execute(
      "INSERT OR IGNORE INTO buckets (name) VALUES (?)",
      params![name],
    )
    .map_err(|e| eyre!("Failed to open bucket {}: {}", name, e))?;
  Ok(())
}

fn insert_entry(
  conn: &Connection,
  bucket: &str,
  request: &Request,
  response: &Response,
) -> Result<()> {
  if !request.is_get() {
    return Err(eyre!(
      "Refusing to cache {} request for {}",
      request.method,
      request.url
    ));
  }

  // Status line and headers travel as JSON; the body is stored raw.
  let meta =
    serde_json::to_string(response).map_err(|e| eyre!("Failed to serialize response: {}", e))?;

  conn
    .execute(
      "INSERT OR REPLACE INTO entries (bucket, url, meta, body, cached_at)
       VALUES (?, ?, ?, ?, datetime('now'))",
      params![bucket, request.cache_key(), meta, response.body],
    )
    .map_err(|e| eyre!("Failed to store {} in {}: {}", request.url, bucket, e))?;

  Ok(())
}

impl CacheStorage for SqliteStorage {
  fn open_bucket(&self, name: &str) -> Result<()> {
    let conn = self.lock()?;
    ensure_bucket(&conn, name)
  }

  fn has_bucket(&self, name: &str) -> Result<bool> {
    let conn = self.lock()?;

    let found: Option<i64> = conn
      .query_row(
        "SELECT id FROM buckets WHERE name = ?",
        params![name],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to look up bucket {}: {}", name, e))?;

    Ok(found.is_some())
  }

  fn bucket_names(&self) -> Result<Vec<String>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT name FROM buckets ORDER BY id")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list buckets: {}", e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read bucket name: {}", e))?;

    Ok(names)
  }

  fn delete_bucket(&self, name: &str) -> Result<bool> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute("DELETE FROM entries WHERE bucket = ?", params![name])
      .map_err(|e| eyre!("Failed to delete entries of {}: {}", name, e))?;
    let removed = tx
      .execute("DELETE FROM buckets WHERE name = ?", params![name])
      .map_err(|e| eyre!("Failed to delete bucket {}: {}", name, e))?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(removed > 0)
  }

  fn put(&self, bucket: &str, request: &Request, response: &Response) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    ensure_bucket(&tx, bucket)?;
    insert_entry(&tx, bucket, request, response)?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn put_all(&self, bucket: &str, entries: &[(Request, Response)]) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    ensure_bucket(&tx, bucket)?;
    for (request, response) in entries {
      // Dropping the transaction on error rolls everything back
      insert_entry(&tx, bucket, request, response)?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn match_request(&self, bucket: &str, request: &Request) -> Result<Option<CachedResponse>> {
    if !request.is_get() {
      return Ok(None);
    }

    let conn = self.lock()?;

    let row: Option<(String, Vec<u8>, String)> = conn
      .query_row(
        "SELECT meta, body, cached_at FROM entries WHERE bucket = ? AND url = ?",
        params![bucket, request.cache_key()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to match {} in {}: {}", request.url, bucket, e))?;

    match row {
      Some((meta, body, cached_at_str)) => {
        let mut response: Response = serde_json::from_str(&meta)
          .map_err(|e| eyre!("Failed to deserialize cached response: {}", e))?;
        response.body = body;
        let cached_at = parse_datetime(&cached_at_str)?;
        Ok(Some(CachedResponse {
          response,
          cached_at,
        }))
      }
      None => Ok(None),
    }
  }

  fn keys(&self, bucket: &str) -> Result<Vec<String>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT url FROM entries WHERE bucket = ? ORDER BY rowid")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let urls = stmt
      .query_map(params![bucket], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list keys of {}: {}", bucket, e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read key: {}", e))?;

    Ok(urls)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
