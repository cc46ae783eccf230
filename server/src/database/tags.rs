use sqlx::SqlitePool;

use crate::database::utils::{generate_uuid_token, get_timestamp};
use shared::types::tag::TagRecord;

/// List all tags, alphabetical.
pub async fn list_tags(pool: &SqlitePool) -> sqlx::Result<Vec<TagRecord>> {
    let rows: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT id, name, created_at FROM tags ORDER BY name")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, created_at)| TagRecord {
            id,
            name,
            created_at,
        })
        .collect())
}

/// Fetch a single tag by id.
pub async fn get_tag(pool: &SqlitePool, tag_id: &str) -> sqlx::Result<Option<TagRecord>> {
    let row: Option<(String, String, i64)> =
        sqlx::query_as("SELECT id, name, created_at FROM tags WHERE id = ?1")
            .bind(tag_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(id, name, created_at)| TagRecord {
        id,
        name,
        created_at,
    }))
}

/// Fetch a tag by its (unique) name.
pub async fn get_tag_by_name(pool: &SqlitePool, name: &str) -> sqlx::Result<Option<TagRecord>> {
    let row: Option<(String, String, i64)> =
        sqlx::query_as("SELECT id, name, created_at FROM tags WHERE name = ?1")
            .bind(name)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(id, name, created_at)| TagRecord {
        id,
        name,
        created_at,
    }))
}

/// Create a tag. Fails on a duplicate name (UNIQUE constraint).
pub async fn create_tag(pool: &SqlitePool, name: &str) -> sqlx::Result<TagRecord> {
    let id = generate_uuid_token();
    let now = get_timestamp();

    sqlx::query("INSERT INTO tags (id, name, created_at) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(name)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(TagRecord {
        id,
        name: name.to_string(),
        created_at: now,
    })
}

/// Get-or-create by name. Attaching tags to books goes through this so the
/// same name never produces two rows.
pub async fn ensure_tag(pool: &SqlitePool, name: &str) -> sqlx::Result<TagRecord> {
    if let Some(existing) = get_tag_by_name(pool, name).await? {
        return Ok(existing);
    }
    create_tag(pool, name).await
}

/// Rename a tag. Returns the updated record, or None when it does not exist.
pub async fn update_tag(
    pool: &SqlitePool,
    tag_id: &str,
    name: &str,
) -> sqlx::Result<Option<TagRecord>> {
    let result = sqlx::query("UPDATE tags SET name = ?1 WHERE id = ?2")
        .bind(name)
        .bind(tag_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_tag(pool, tag_id).await
}

/// Delete a tag. Join rows go with it via ON DELETE CASCADE.
pub async fn delete_tag(pool: &SqlitePool, tag_id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?1")
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Attach a set of tag names to a book, creating tags as needed.
/// Re-attaching is a no-op (INSERT OR IGNORE on the join table).
pub async fn attach_tags_to_book(
    pool: &SqlitePool,
    book_id: &str,
    names: &[String],
) -> sqlx::Result<Vec<TagRecord>> {
    for name in names {
        let tag = ensure_tag(pool, name).await?;
        sqlx::query("INSERT OR IGNORE INTO book_tags (book_id, tag_id) VALUES (?1, ?2)")
            .bind(book_id)
            .bind(&tag.id)
            .execute(pool)
            .await?;
    }
    tags_for_book(pool, book_id).await
}

/// All tags attached to a book, alphabetical.
pub async fn tags_for_book(pool: &SqlitePool, book_id: &str) -> sqlx::Result<Vec<TagRecord>> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT t.id, t.name, t.created_at FROM tags t
         JOIN book_tags bt ON bt.tag_id = t.id
         WHERE bt.book_id = ?1 ORDER BY t.name",
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, created_at)| TagRecord {
            id,
            name,
            created_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::books::create_book;
    use crate::database::create::open_memory_pool;
    use crate::database::users::{create_user, NewUser};
    use shared::types::book::BookCreateData;

    async fn pool_with_book() -> (SqlitePool, String) {
        let pool = open_memory_pool().await.unwrap();
        let user = create_user(
            &pool,
            NewUser {
                username: "tagger".to_string(),
                email: "tagger@example.com".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "$argon2id$fake".to_string(),
            },
        )
        .await
        .unwrap();
        let book = create_book(
            &pool,
            &BookCreateData {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                publisher: "Chilton".to_string(),
                page_count: 412,
                language: "English".to_string(),
                published_date: "1965-08-01".to_string(),
            },
            &user.id,
        )
        .await
        .unwrap();
        (pool, book.id)
    }

    #[tokio::test]
    async fn crud_roundtrip() {
        let (pool, _) = pool_with_book().await;

        let tag = create_tag(&pool, "sci-fi").await.unwrap();
        assert_eq!(get_tag(&pool, &tag.id).await.unwrap().unwrap().name, "sci-fi");
        assert!(create_tag(&pool, "sci-fi").await.is_err()); // duplicate name

        let renamed = update_tag(&pool, &tag.id, "science-fiction")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "science-fiction");

        assert!(delete_tag(&pool, &tag.id).await.unwrap());
        assert!(get_tag(&pool, &tag.id).await.unwrap().is_none());
        assert!(update_tag(&pool, &tag.id, "gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ensure_tag_reuses_existing_rows() {
        let (pool, _) = pool_with_book().await;
        let first = ensure_tag(&pool, "classic").await.unwrap();
        let second = ensure_tag(&pool, "classic").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(list_tags(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attach_is_idempotent_and_creates_missing_tags() {
        let (pool, book_id) = pool_with_book().await;
        let names = vec!["sci-fi".to_string(), "classic".to_string()];

        let attached = attach_tags_to_book(&pool, &book_id, &names).await.unwrap();
        assert_eq!(attached.len(), 2);

        // Re-attaching the same names changes nothing.
        let again = attach_tags_to_book(&pool, &book_id, &names).await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(list_tags(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn deleting_a_tag_detaches_it_from_books() {
        let (pool, book_id) = pool_with_book().await;
        let attached = attach_tags_to_book(&pool, &book_id, &["epic".to_string()])
            .await
            .unwrap();
        assert_eq!(attached.len(), 1);

        delete_tag(&pool, &attached[0].id).await.unwrap();
        assert!(tags_for_book(&pool, &book_id).await.unwrap().is_empty());
    }
}
