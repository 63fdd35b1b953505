//! TursoCollection - DocumentStore Implementation for Turso/libsql
//!
//! One collection maps to one libsql table holding extended-JSON bodies
//! keyed by document id:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS <collection> (
//!     doc_id TEXT PRIMARY KEY,
//!     body   TEXT NOT NULL
//! )
//! ```
//!
//! Filters run as `json_extract` equality against the body column, with
//! `_id` clauses short-circuited to the primary key. Writes go through a
//! read-decode-modify-encode cycle so the body text stays canonical and
//! no-op updates can be detected.
//!
//! Local targets are directories: the configured database becomes
//! `<target>/<database>.db`, with `:memory:` passed straight through.
//! Targets that look like URLs open a remote connection instead.

use async_trait::async_trait;
use libsql::{Builder, Connection};
use std::path::PathBuf;

use crate::config::StoreConfig;
use crate::db::error::StoreError;
use crate::db::store::{DocumentStore, UpdateOutcome};
use crate::models::{Document, FieldValue, Filter, ObjectId};

/// Remote URL schemes understood by the libsql builder.
const REMOTE_SCHEMES: [&str; 5] = ["libsql://", "http://", "https://", "ws://", "wss://"];

/// Maximum f64 magnitude that is still an exact integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single collection within a libsql database.
///
/// Holds the one connection opened at [`TursoCollection::open`]; the
/// liveness probe and every operation run on that same handle, so a
/// probe that passes vouches for the handle services will use next.
pub struct TursoCollection {
    conn: Connection,
    collection: String,
}

impl std::fmt::Debug for TursoCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // libsql::Connection has no Debug impl, so it is omitted here.
        f.debug_struct("TursoCollection")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl TursoCollection {
    /// Open the database a store config points at. Does not touch the
    /// collection table; call [`TursoCollection::prepare_collection`]
    /// after the connection has been verified.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if !is_valid_collection_name(&config.collection) {
            return Err(StoreError::InvalidCollection {
                name: config.collection.clone(),
            });
        }

        let target = config.connection_target.as_str();
        let (db, remote) = if is_remote_target(target) {
            let db = Builder::new_remote(
                target.to_string(),
                config.auth_token.clone().unwrap_or_default(),
            )
            .build()
            .await
            .map_err(|e| StoreError::open_failed(PathBuf::from(target), e))?;
            (db, true)
        } else if target == ":memory:" {
            let db = Builder::new_local(":memory:")
                .build()
                .await
                .map_err(|e| StoreError::open_failed(PathBuf::from(target), e))?;
            (db, false)
        } else {
            std::fs::create_dir_all(target)?;
            let db_path = PathBuf::from(target).join(format!("{}.db", config.database));
            let db = Builder::new_local(&db_path)
                .build()
                .await
                .map_err(|e| StoreError::open_failed(db_path.clone(), e))?;
            (db, false)
        };

        let conn = db.connect().map_err(StoreError::LibsqlError)?;
        if !remote {
            // Concurrent local operations wait and retry instead of
            // failing immediately with a busy error.
            execute_pragma(&conn, "PRAGMA busy_timeout = 5000").await?;
        }

        Ok(Self {
            conn,
            collection: config.collection.clone(),
        })
    }

    /// Idempotently create the collection table.
    pub async fn prepare_collection(&self) -> Result<(), StoreError> {
        self.conn
            .execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS \"{}\" (
                    doc_id TEXT PRIMARY KEY,
                    body TEXT NOT NULL
                )",
                    self.collection
                ),
                (),
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!(
                    "Failed to create collection '{}': {}",
                    self.collection, e
                ))
            })?;
        Ok(())
    }

    /// Collection this store reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Insert a document, assigning a generated `_id` when absent.
    /// Returns the id text the document is stored under.
    pub async fn insert_one(&self, document: Document) -> Result<String, StoreError> {
        let document = ensure_id(document);
        let id_text = document
            .display_id()
            .ok_or_else(|| StoreError::codec("document lost its _id during insert"))?;
        let body = document.to_json().to_string();

        self.conn
            .execute(
                &format!(
                    "INSERT INTO \"{}\" (doc_id, body) VALUES (?, ?)",
                    self.collection
                ),
                (id_text.as_str(), body.as_str()),
            )
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to insert document: {}", e)))?;

        Ok(id_text)
    }

    fn build_find_sql(&self, filter: &Filter) -> (String, Vec<libsql::Value>) {
        let mut sql = format!("SELECT body FROM \"{}\"", self.collection);
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        for clause in filter.clauses() {
            if clause.path == "_id" {
                conditions.push("doc_id = ?".to_string());
                params.push(libsql::Value::Text(clause.value.display_text()));
                continue;
            }
            match bind_value(&clause.value) {
                // A null clause matches both explicit null and absent
                // fields; json_extract returns NULL for either.
                None => {
                    conditions.push("json_extract(body, ?) IS NULL".to_string());
                    params.push(libsql::Value::Text(json_path(&clause.path)));
                }
                Some(value) => {
                    conditions.push("json_extract(body, ?) = ?".to_string());
                    params.push(libsql::Value::Text(json_path(&clause.path)));
                    params.push(value);
                }
            }
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" LIMIT 1");
        (sql, params)
    }

    /// Convert a fetched row into a Document
    ///
    /// This is the central conversion point for all read operations.
    fn row_to_document(row: &libsql::Row) -> Result<Document, StoreError> {
        let body: String = row
            .get(0)
            .map_err(|e| StoreError::row_decode(format!("Failed to get body column: {}", e)))?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| StoreError::codec(format!("Stored body is not valid JSON: {}", e)))?;
        Document::from_json_object(value).map_err(|e| StoreError::codec(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for TursoCollection {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1")
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to prepare ping: {}", e)))?;
        let _ = stmt
            .query(())
            .await
            .map_err(|e| StoreError::sql_execution(format!("Failed to execute ping: {}", e)))?;
        Ok(())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let (sql, params) = self.build_find_sql(filter);

        let mut stmt = self.conn.prepare(&sql).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to prepare find query: {}", e))
        })?;
        let mut rows = stmt
            .query(libsql::params_from_iter(params))
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to execute find query: {}", e))
            })?;

        match rows
            .next()
            .await
            .map_err(|e| StoreError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_one(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut document = match self.find_one(&Filter::by_id(id)).await? {
            Some(document) => document,
            None => {
                return Ok(UpdateOutcome {
                    acknowledged: true,
                    modified_count: 0,
                })
            }
        };

        let new_value = FieldValue::String(value.to_string());
        if document.get(key) == Some(&new_value) {
            return Ok(UpdateOutcome {
                acknowledged: true,
                modified_count: 0,
            });
        }

        document.insert(key, new_value);
        let body = document.to_json().to_string();

        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE \"{}\" SET body = ? WHERE doc_id = ?",
                    self.collection
                ),
                (body.as_str(), id),
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to update document '{}': {}", id, e))
            })?;

        Ok(UpdateOutcome {
            acknowledged: true,
            modified_count: changed,
        })
    }
}

fn is_remote_target(target: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| target.starts_with(scheme))
}

/// Collection names are interpolated as identifiers, so the charset is
/// restricted instead of relying on quoting alone.
fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Dotted field path to a SQLite JSON path.
fn json_path(path: &str) -> String {
    format!("$.{}", path)
}

/// Execute a PRAGMA statement
///
/// PRAGMA statements return rows, so query() is required instead of
/// execute().
async fn execute_pragma(conn: &Connection, pragma: &str) -> Result<(), StoreError> {
    let mut stmt = conn
        .prepare(pragma)
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to execute '{}': {}", pragma, e)))?;
    let _ = stmt
        .query(())
        .await
        .map_err(|e| StoreError::sql_execution(format!("Failed to execute '{}': {}", pragma, e)))?;
    Ok(())
}

/// SQL parameter for a scalar clause value. `None` means the clause
/// must match SQL NULL instead of binding a value.
///
/// Tagged scalars compare against the compact JSON text form, which is
/// exactly what `json_extract` returns for object-valued fields.
fn bind_value(value: &FieldValue) -> Option<libsql::Value> {
    match value {
        FieldValue::Null => None,
        FieldValue::Bool(b) => Some(libsql::Value::Integer(i64::from(*b))),
        FieldValue::Number(n) => {
            if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
                Some(libsql::Value::Integer(*n as i64))
            } else {
                Some(libsql::Value::Real(*n))
            }
        }
        FieldValue::String(s) => Some(libsql::Value::Text(s.clone())),
        tagged => Some(libsql::Value::Text(tagged.to_json().to_string())),
    }
}

fn ensure_id(document: Document) -> Document {
    if document.id().is_some() {
        return document;
    }
    let mut with_id = Document::new();
    with_id.insert("_id", FieldValue::ObjectId(ObjectId::generate()));
    for (key, value) in document.iter() {
        with_id.insert(key.clone(), value.clone());
    }
    with_id
}
