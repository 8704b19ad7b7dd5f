use crate::errors::ApiError;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use uuid::Uuid;

pub type Db = Pool<Sqlite>;

pub async fn connect(db_url: &str) -> Result<Db, ApiError> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|_| ApiError::Internal)
}

pub async fn init_schema(db: &Db) -> Result<(), ApiError> {
    // NOTE: Keep schema minimal and explicit. Members and events are
    // append-only; the group tree is rebuilt from `members` on startup.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS members (
  position INTEGER PRIMARY KEY,
  commitment_hex TEXT NOT NULL UNIQUE,
  username TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS greetings (
  id TEXT PRIMARY KEY,
  created_at TEXT NOT NULL,
  message TEXT NOT NULL,
  merkle_root_hex TEXT NOT NULL,
  nullifier_hash_hex TEXT NOT NULL UNIQUE,
  proof_b64 TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
  seq INTEGER PRIMARY KEY AUTOINCREMENT,
  created_at TEXT NOT NULL,
  kind TEXT NOT NULL,
  payload_json TEXT NOT NULL
);
"#,
    )
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

pub async fn insert_member(
    db: &Db,
    position: u32,
    commitment_hex: &str,
    username: &str,
) -> Result<(), ApiError> {
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO members (position, commitment_hex, username, created_at)
           VALUES (?, ?, ?, ?)"#,
    )
    .bind(position as i64)
    .bind(commitment_hex)
    .bind(username)
    .bind(created_at)
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

/// All members in join order (position 0, 1, ...).
pub async fn list_members(db: &Db) -> Result<Vec<(u32, String, String)>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT position, commitment_hex, username FROM members ORDER BY position"#,
    )
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let position: i64 = row.get(0);
        let commitment_hex: String = row.get(1);
        let username: String = row.get(2);
        out.push((position as u32, commitment_hex, username));
    }

    Ok(out)
}

pub async fn insert_greeting(
    db: &Db,
    greeting_id: Uuid,
    message: &str,
    merkle_root_hex: &str,
    nullifier_hash_hex: &str,
    proof_b64: &str,
) -> Result<(), ApiError> {
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO greetings (id, created_at, message, merkle_root_hex, nullifier_hash_hex, proof_b64)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(greeting_id.to_string())
    .bind(created_at)
    .bind(message)
    .bind(merkle_root_hex)
    .bind(nullifier_hash_hex)
    .bind(proof_b64)
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

pub async fn list_greetings(
    db: &Db,
) -> Result<Vec<(Uuid, DateTime<Utc>, String, String, String)>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT id, created_at, message, merkle_root_hex, nullifier_hash_hex
           FROM greetings ORDER BY created_at"#,
    )
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.get(0);
        let id = Uuid::parse_str(&id).map_err(|_| ApiError::Internal)?;

        let created_at: String = row.get(1);
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|_| ApiError::Internal)?
            .with_timezone(&Utc);

        let message: String = row.get(2);
        let merkle_root_hex: String = row.get(3);
        let nullifier_hash_hex: String = row.get(4);

        out.push((id, created_at, message, merkle_root_hex, nullifier_hash_hex));
    }

    Ok(out)
}

/// Nullifier hashes consumed so far, for state rebuild on startup.
pub async fn list_nullifier_hashes(db: &Db) -> Result<Vec<String>, ApiError> {
    let rows = sqlx::query(r#"SELECT nullifier_hash_hex FROM greetings"#)
        .fetch_all(db)
        .await
        .map_err(|_| ApiError::Internal)?;

    Ok(rows.into_iter().map(|row| row.get(0)).collect())
}

pub async fn insert_event(db: &Db, kind: &str, payload_json: &str) -> Result<i64, ApiError> {
    let created_at = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"INSERT INTO events (created_at, kind, payload_json) VALUES (?, ?, ?)"#,
    )
    .bind(created_at)
    .bind(kind)
    .bind(payload_json)
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(result.last_insert_rowid())
}

/// Events in emission order.
pub async fn list_events(
    db: &Db,
) -> Result<Vec<(i64, DateTime<Utc>, String, String)>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT seq, created_at, kind, payload_json FROM events ORDER BY seq"#,
    )
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let seq: i64 = row.get(0);

        let created_at: String = row.get(1);
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|_| ApiError::Internal)?
            .with_timezone(&Utc);

        let kind: String = row.get(2);
        let payload_json: String = row.get(3);

        out.push((seq, created_at, kind, payload_json));
    }

    Ok(out)
}
