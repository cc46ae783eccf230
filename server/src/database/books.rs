use sqlx::SqlitePool;

use crate::database::utils::{generate_uuid_token, get_timestamp};
use shared::types::book::{BookCreateData, BookRecord, BookUpdateData};

type BookRow = (
    String,
    String,
    String,
    String,
    i64,
    String,
    String,
    String,
    i64,
    i64,
);

fn into_record(row: BookRow) -> BookRecord {
    let (
        id,
        title,
        author,
        publisher,
        page_count,
        language,
        published_date,
        user_id,
        created_at,
        updated_at,
    ) = row;
    BookRecord {
        id,
        title,
        author,
        publisher,
        page_count,
        language,
        published_date,
        user_id,
        created_at,
        updated_at,
    }
}

const BOOK_COLUMNS: &str =
    "id, title, author, publisher, page_count, language, published_date, user_id, created_at, updated_at";

/// Insert a new book owned by `user_id` and return the stored record.
pub async fn create_book(
    pool: &SqlitePool,
    data: &BookCreateData,
    user_id: &str,
) -> sqlx::Result<BookRecord> {
    let id = generate_uuid_token();
    let now = get_timestamp();

    sqlx::query(
        "INSERT INTO books (id, title, author, publisher, page_count, language, published_date, user_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
    )
    .bind(&id)
    .bind(&data.title)
    .bind(&data.author)
    .bind(&data.publisher)
    .bind(data.page_count)
    .bind(&data.language)
    .bind(&data.published_date)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(BookRecord {
        id,
        title: data.title.clone(),
        author: data.author.clone(),
        publisher: data.publisher.clone(),
        page_count: data.page_count,
        language: data.language.clone(),
        published_date: data.published_date.clone(),
        user_id: user_id.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Fetch a single book by id.
pub async fn get_book(pool: &SqlitePool, book_id: &str) -> sqlx::Result<Option<BookRecord>> {
    let row: Option<BookRow> = sqlx::query_as(&format!(
        "SELECT {} FROM books WHERE id = ?1",
        BOOK_COLUMNS
    ))
    .bind(book_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(into_record))
}

/// List every book, newest first.
pub async fn list_books(pool: &SqlitePool) -> sqlx::Result<Vec<BookRecord>> {
    let rows: Vec<BookRow> = sqlx::query_as(&format!(
        "SELECT {} FROM books ORDER BY created_at DESC",
        BOOK_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(into_record).collect())
}

/// List books submitted by one user, newest first.
pub async fn list_user_books(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<BookRecord>> {
    let rows: Vec<BookRow> = sqlx::query_as(&format!(
        "SELECT {} FROM books WHERE user_id = ?1 ORDER BY created_at DESC",
        BOOK_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(into_record).collect())
}

/// Partial update: only fields present in `data` change, `updated_at` always
/// moves. Returns the updated record, or None when the book does not exist.
pub async fn update_book(
    pool: &SqlitePool,
    book_id: &str,
    data: &BookUpdateData,
) -> sqlx::Result<Option<BookRecord>> {
    let Some(mut book) = get_book(pool, book_id).await? else {
        return Ok(None);
    };

    if let Some(title) = &data.title {
        book.title = title.clone();
    }
    if let Some(author) = &data.author {
        book.author = author.clone();
    }
    if let Some(publisher) = &data.publisher {
        book.publisher = publisher.clone();
    }
    if let Some(page_count) = data.page_count {
        book.page_count = page_count;
    }
    if let Some(language) = &data.language {
        book.language = language.clone();
    }
    if let Some(published_date) = &data.published_date {
        book.published_date = published_date.clone();
    }
    book.updated_at = get_timestamp();

    sqlx::query(
        "UPDATE books SET title = ?1, author = ?2, publisher = ?3, page_count = ?4,
         language = ?5, published_date = ?6, updated_at = ?7 WHERE id = ?8",
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.publisher)
    .bind(book.page_count)
    .bind(&book.language)
    .bind(&book.published_date)
    .bind(book.updated_at)
    .bind(book_id)
    .execute(pool)
    .await?;

    Ok(Some(book))
}

/// Delete a book. Returns false when no row matched.
pub async fn delete_book(pool: &SqlitePool, book_id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?1")
        .bind(book_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create::open_memory_pool;
    use crate::database::users::{create_user, NewUser};

    async fn fixture() -> (SqlitePool, String) {
        let pool = open_memory_pool().await.unwrap();
        let user = create_user(
            &pool,
            NewUser {
                username: "reader".to_string(),
                email: "reader@example.com".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "$argon2id$fake".to_string(),
            },
        )
        .await
        .unwrap();
        (pool, user.id)
    }

    fn sample_book() -> BookCreateData {
        BookCreateData {
            title: "The Rust Programming Language".to_string(),
            author: "Steve Klabnik".to_string(),
            publisher: "No Starch Press".to_string(),
            page_count: 552,
            language: "English".to_string(),
            published_date: "2019-08-12".to_string(),
        }
    }

    #[tokio::test]
    async fn create_get_list_roundtrip() {
        let (pool, uid) = fixture().await;
        let created = create_book(&pool, &sample_book(), &uid).await.unwrap();

        let fetched = get_book(&pool, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "The Rust Programming Language");
        assert_eq!(fetched.user_id, uid);

        assert_eq!(list_books(&pool).await.unwrap().len(), 1);
        assert_eq!(list_user_books(&pool, &uid).await.unwrap().len(), 1);
        assert!(list_user_books(&pool, "other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_update_touches_only_named_fields() {
        let (pool, uid) = fixture().await;
        let created = create_book(&pool, &sample_book(), &uid).await.unwrap();

        let patch = BookUpdateData {
            title: Some("TRPL, 2nd ed.".to_string()),
            page_count: Some(560),
            ..Default::default()
        };
        let updated = update_book(&pool, &created.id, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "TRPL, 2nd ed.");
        assert_eq!(updated.page_count, 560);
        assert_eq!(updated.author, created.author);
        assert_eq!(updated.published_date, created.published_date);
    }

    #[tokio::test]
    async fn update_and_delete_missing_book() {
        let (pool, _) = fixture().await;
        assert!(update_book(&pool, "nope", &BookUpdateData::default())
            .await
            .unwrap()
            .is_none());
        assert!(!delete_book(&pool, "nope").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let (pool, uid) = fixture().await;
        let created = create_book(&pool, &sample_book(), &uid).await.unwrap();
        assert!(delete_book(&pool, &created.id).await.unwrap());
        assert!(get_book(&pool, &created.id).await.unwrap().is_none());
    }
}
