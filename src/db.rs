use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

pub const DB_FILE: &str = "rosterd.sqlite3";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMeta {
    pub key: String,
    pub digest: String,
    pub updated_at: String,
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!("failed to create workspace {}", workspace.to_string_lossy())
    })?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS blobs(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            digest TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(conn)
}

pub fn digest_of(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Stores `value` under `key`, replacing any previous blob.
pub fn blob_put(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<BlobMeta> {
    let text = serde_json::to_string(value).context("failed to serialize blob")?;
    let meta = BlobMeta {
        key: key.to_string(),
        digest: digest_of(&text),
        updated_at: chrono::Utc::now().to_rfc3339(),
    };
    conn.execute(
        "INSERT INTO blobs(key, value, digest, updated_at) VALUES(?, ?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           digest = excluded.digest,
           updated_at = excluded.updated_at",
        (&meta.key, &text, &meta.digest, &meta.updated_at),
    )?;
    Ok(meta)
}

pub fn blob_get(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<(BlobMeta, serde_json::Value)>> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT value, digest, updated_at FROM blobs WHERE key = ?",
            [key],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let Some((text, digest, updated_at)) = row else {
        return Ok(None);
    };
    let value = serde_json::from_str(&text)
        .with_context(|| format!("blob {key} is not valid json"))?;
    Ok(Some((
        BlobMeta {
            key: key.to_string(),
            digest,
            updated_at,
        },
        value,
    )))
}

/// Blobs whose key starts with `prefix`, ordered by key.
pub fn blob_list(conn: &Connection, prefix: &str) -> anyhow::Result<Vec<BlobMeta>> {
    let mut stmt = conn.prepare(
        "SELECT key, digest, updated_at FROM blobs
         WHERE substr(key, 1, length(?1)) = ?1
         ORDER BY key",
    )?;
    let rows = stmt
        .query_map([prefix], |r| {
            Ok(BlobMeta {
                key: r.get(0)?,
                digest: r.get(1)?,
                updated_at: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn blob_delete(conn: &Connection, key: &str) -> anyhow::Result<bool> {
    let n = conn.execute("DELETE FROM blobs WHERE key = ?", [key])?;
    Ok(n > 0)
}
