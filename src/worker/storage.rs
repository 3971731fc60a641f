//! Named response caches in SQLite.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;

use crate::net::{Headers, Method, Request, Response};

/// Errors from the response store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
  #[error("failed to open response store at {path}: {source}")]
  Open {
    path: String,
    source: rusqlite::Error,
  },
  #[error("failed to create store directory: {0}")]
  Directory(#[from] std::io::Error),
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("malformed stored headers: {0}")]
  Headers(#[from] serde_json::Error),
  #[error("lock poisoned")]
  Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Key for a request: hex SHA-256 of "METHOD url".
pub fn request_key(method: Method, url: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(method.as_str().as_bytes());
  hasher.update(b" ");
  hasher.update(url.as_bytes());
  hex::encode(hasher.finalize())
}

/// A stored response together with its request identity.
#[derive(Debug, Clone)]
pub struct StoredEntry {
  pub key: String,
  pub url: String,
  pub response: Response,
}

/// SQLite-backed set of named response caches.
pub struct ResponseStore {
  conn: Mutex<Connection>,
}

impl ResponseStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> StoreResult<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path).map_err(|source| StoreError::Open {
      path: path.display().to_string(),
      source,
    })?;
    Self::with_connection(conn)
  }

  /// Store that lives only as long as the process.
  #[cfg(test)]
  pub fn in_memory() -> StoreResult<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> StoreResult<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn conn(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| StoreError::Poisoned)
  }

  /// Create the named cache if it does not exist yet.
  pub fn open_cache(&self, name: &str) -> StoreResult<()> {
    self.conn()?.execute(
      "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
      params![name, Utc::now().to_rfc3339()],
    )?;
    Ok(())
  }

  /// Cache names in creation order.
  pub fn cache_names(&self) -> StoreResult<Vec<String>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY seq")?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
  }

  /// Drop a cache and everything in it. Returns whether it existed.
  pub fn delete_cache(&self, name: &str) -> StoreResult<bool> {
    let conn = self.conn()?;
    conn.execute(
      "DELETE FROM cached_responses WHERE cache_name = ?1",
      params![name],
    )?;
    let deleted = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
    Ok(deleted > 0)
  }

  /// Store `response` for `request` in `cache`, replacing any previous entry.
  pub fn put(&self, cache: &str, request: &Request, response: &Response) -> StoreResult<()> {
    self.open_cache(cache)?;
    let key = request_key(request.method, request.url.as_str());
    let headers = serde_json::to_string(&response.headers)?;
    self.conn()?.execute(
      "INSERT OR REPLACE INTO cached_responses
         (cache_name, request_key, url, status, status_text, headers, body, stored_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      params![
        cache,
        key,
        request.url.as_str(),
        response.status,
        response.status_text,
        headers,
        response.body,
        Utc::now().to_rfc3339(),
      ],
    )?;
    Ok(())
  }

  /// Look `request` up in every cache, oldest cache first.
  pub fn match_any(&self, request: &Request) -> StoreResult<Option<Response>> {
    let key = request_key(request.method, request.url.as_str());
    let conn = self.conn()?;
    let row = conn
      .query_row(
        "SELECT r.status, r.status_text, r.headers, r.body
           FROM cached_responses r JOIN caches c ON c.name = r.cache_name
          WHERE r.request_key = ?1
          ORDER BY c.seq
          LIMIT 1",
        params![key],
        |row| {
          Ok((
            row.get::<_, u16>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Vec<u8>>(3)?,
          ))
        },
      )
      .optional()?;

    row
      .map(|(status, status_text, headers, body)| -> StoreResult<Response> {
        Ok(Response {
          status,
          status_text,
          headers: serde_json::from_str::<Headers>(&headers)?,
          body,
        })
      })
      .transpose()
  }

  /// Every entry of `cache`.
  pub fn entries(&self, cache: &str) -> StoreResult<Vec<StoredEntry>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(
      "SELECT request_key, url, status, status_text, headers, body
         FROM cached_responses WHERE cache_name = ?1",
    )?;
    let rows = stmt
      .query_map(params![cache], |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, String>(1)?,
          row.get::<_, u16>(2)?,
          row.get::<_, String>(3)?,
          row.get::<_, String>(4)?,
          row.get::<_, Vec<u8>>(5)?,
        ))
      })?
      .collect::<Result<Vec<_>, _>>()?;

    rows
      .into_iter()
      .map(|(key, url, status, status_text, headers, body)| -> StoreResult<StoredEntry> {
        Ok(StoredEntry {
          key,
          url,
          response: Response {
            status,
            status_text,
            headers: serde_json::from_str(&headers)?,
            body,
          },
        })
      })
      .collect()
  }

  pub fn delete(&self, cache: &str, key: &str) -> StoreResult<bool> {
    let deleted = self.conn()?.execute(
      "DELETE FROM cached_responses WHERE cache_name = ?1 AND request_key = ?2",
      params![cache, key],
    )?;
    Ok(deleted > 0)
  }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS caches (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cached_responses (
    cache_name TEXT NOT NULL,
    request_key TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    status_text TEXT NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    stored_at TEXT NOT NULL,
    PRIMARY KEY (cache_name, request_key)
);
"#;
