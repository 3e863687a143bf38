//! # Trash Repository
//!
//! The deleted-entry mirror. The ledger only ever writes here; these reads
//! exist for forensic recovery tooling and tests.

use sqlx::SqlitePool;

use super::decode_instant;
use crate::error::DbResult;
use tally_core::TrashRecord;

#[derive(Debug, sqlx::FromRow)]
struct TrashRow {
    payload: String,
    deleted_at: String,
    reason: String,
}

#[derive(Debug, Clone)]
pub struct TrashRepository {
    pool: SqlitePool,
}

impl TrashRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TrashRepository { pool }
    }

    /// The mirror of a deleted entry, keyed by the entry's original id.
    pub async fn get(&self, entry_id: &str) -> DbResult<Option<TrashRecord>> {
        let row = sqlx::query_as::<_, TrashRow>(
            "SELECT payload, deleted_at, reason FROM consumptions_trash WHERE id = ?1",
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(TrashRecord {
                entry: serde_json::from_str(&row.payload)?,
                deleted_at: decode_instant(&row.deleted_at)?,
                reason: row.reason,
            })),
            None => Ok(None),
        }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consumptions_trash")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
