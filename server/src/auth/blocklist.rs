//! Revoked-token store.
//!
//! Logout writes the token's jti here with a TTL equal to the token's
//! remaining validity; the bearer gate consults it on every protected
//! request. Entries past their TTL read as absent, so nothing ever needs an
//! explicit delete.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::utils::get_timestamp;

/// Two-operation contract the auth core depends on. `add` must be
/// idempotent — revoking an already-revoked token is a no-op, not an error.
#[async_trait]
pub trait TokenBlocklist: Send + Sync {
    async fn add(&self, jti: &str, ttl_secs: u64) -> anyhow::Result<()>;
    async fn is_revoked(&self, jti: &str) -> anyhow::Result<bool>;
}

// ---------------------------------------------------------------------------
// SQLite-backed store (production)
// ---------------------------------------------------------------------------

/// Blocklist rows live in the `revoked_tokens` table next to the rest of the
/// catalogue data.
pub struct SqliteBlocklist {
    pool: SqlitePool,
}

impl SqliteBlocklist {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Drop rows whose TTL has elapsed. Membership checks already ignore
    /// them; this just keeps the table from growing without bound.
    pub async fn purge_expired(&self) -> anyhow::Result<u64> {
        let now = get_timestamp();
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        let purged = result.rows_affected();
        if purged > 0 {
            debug!("Purged {} expired blocklist entries", purged);
        }
        Ok(purged)
    }
}

#[async_trait]
impl TokenBlocklist for SqliteBlocklist {
    async fn add(&self, jti: &str, ttl_secs: u64) -> anyhow::Result<()> {
        let expires_at = get_timestamp() + ttl_secs as i64;

        // INSERT OR REPLACE keeps re-adds idempotent; the later expiry wins,
        // which can only ever extend coverage.
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at)
             VALUES (?1, ?2)
             ON CONFLICT(jti) DO UPDATE SET expires_at = MAX(expires_at, excluded.expires_at)",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        debug!("Blocklisted jti {} until {}", jti, expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> anyhow::Result<bool> {
        let now = get_timestamp();
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT expires_at FROM revoked_tokens WHERE jti = ?1 AND expires_at > ?2",
        )
        .bind(jti)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }
}

// ---------------------------------------------------------------------------
// In-memory store (tests, single-process deployments)
// ---------------------------------------------------------------------------

/// HashMap-backed implementation of the same contract. Used as the test
/// substitute for [`SqliteBlocklist`].
#[derive(Default)]
pub struct MemoryBlocklist {
    entries: Mutex<HashMap<String, i64>>,
}

impl MemoryBlocklist {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenBlocklist for MemoryBlocklist {
    async fn add(&self, jti: &str, ttl_secs: u64) -> anyhow::Result<()> {
        let expires_at = get_timestamp() + ttl_secs as i64;
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("blocklist mutex poisoned"))?;
        let slot = entries.entry(jti.to_string()).or_insert(expires_at);
        *slot = (*slot).max(expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> anyhow::Result<bool> {
        let now = get_timestamp();
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("blocklist mutex poisoned"))?;
        Ok(entries.get(jti).is_some_and(|exp| *exp > now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_add_then_check() {
        let bl = MemoryBlocklist::new();
        assert!(!bl.is_revoked("jti-1").await.unwrap());
        bl.add("jti-1", 60).await.unwrap();
        assert!(bl.is_revoked("jti-1").await.unwrap());
        assert!(!bl.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn memory_add_is_idempotent() {
        let bl = MemoryBlocklist::new();
        bl.add("jti-1", 60).await.unwrap();
        bl.add("jti-1", 60).await.unwrap();
        assert!(bl.is_revoked("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn memory_expired_entries_read_as_absent() {
        let bl = MemoryBlocklist::new();
        bl.add("jti-1", 0).await.unwrap();
        // ttl of zero expires immediately (expires_at == now is not > now).
        assert!(!bl.is_revoked("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn sqlite_blocklist_roundtrip() {
        let pool = crate::database::create::open_memory_pool().await.unwrap();
        let bl = SqliteBlocklist::new(pool);

        bl.add("jti-1", 60).await.unwrap();
        bl.add("jti-1", 60).await.unwrap(); // idempotent re-add
        assert!(bl.is_revoked("jti-1").await.unwrap());
        assert!(!bl.is_revoked("jti-other").await.unwrap());
    }

    #[tokio::test]
    async fn sqlite_expired_entries_are_absent_and_purgeable() {
        let pool = crate::database::create::open_memory_pool().await.unwrap();
        let bl = SqliteBlocklist::new(pool);

        bl.add("jti-old", 0).await.unwrap();
        assert!(!bl.is_revoked("jti-old").await.unwrap());
        assert_eq!(bl.purge_expired().await.unwrap(), 1);
    }
}
