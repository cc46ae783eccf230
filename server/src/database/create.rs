use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

/// Open a connection pool for the configured database URL.
pub async fn open_pool(url: &str) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new().connect(url).await?;
    Ok(pool)
}

/// Open an in-memory pool with the schema applied — test fixture.
///
/// A single connection is forced because every `sqlite::memory:` connection
/// gets its own private database.
pub async fn open_memory_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_tables(&pool).await?;
    Ok(pool)
}

/// Initialize the database schema.
pub async fn create_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    create_schema(pool).await?;
    create_indexes(pool).await?;
    info!("Database schema ready");
    Ok(())
}

/// Create all tables for a brand-new database.
async fn create_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    // Users table — `role` is 'user' or 'admin'; the auth core reads it,
    // never writes it.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT    PRIMARY KEY,
            username      TEXT    NOT NULL UNIQUE,
            email         TEXT    NOT NULL UNIQUE,
            first_name    TEXT    NOT NULL DEFAULT '',
            last_name     TEXT    NOT NULL DEFAULT '',
            role          TEXT    NOT NULL DEFAULT 'user',
            password_hash TEXT    NOT NULL,
            created_at    INTEGER NOT NULL,
            updated_at    INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS books (
            id             TEXT    PRIMARY KEY,
            title          TEXT    NOT NULL,
            author         TEXT    NOT NULL,
            publisher      TEXT    NOT NULL,
            page_count     INTEGER NOT NULL,
            language       TEXT    NOT NULL,
            published_date TEXT    NOT NULL,
            user_id        TEXT    NOT NULL,
            created_at     INTEGER NOT NULL,
            updated_at     INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tags (
            id         TEXT    PRIMARY KEY,
            name       TEXT    NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Join table — attaching an already-attached tag is a no-op.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS book_tags (
            book_id TEXT NOT NULL,
            tag_id  TEXT NOT NULL,
            PRIMARY KEY (book_id, tag_id),
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id)  REFERENCES tags(id)  ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS reviews (
            id          TEXT    PRIMARY KEY,
            rating      INTEGER NOT NULL,
            review_text TEXT    NOT NULL,
            user_id     TEXT    NOT NULL,
            book_id     TEXT    NOT NULL,
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    // Revocation blocklist — jti values written at logout, rows past
    // expires_at are treated as absent.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS revoked_tokens (
            jti        TEXT    PRIMARY KEY,
            expires_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_user_id ON books(user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_book_id ON reviews(book_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_revoked_expires ON revoked_tokens(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_applies_cleanly_and_is_idempotent() {
        let pool = open_memory_pool().await.unwrap();
        // Re-running must not fail (IF NOT EXISTS everywhere).
        create_tables(&pool).await.unwrap();
    }
}
