use sqlx::SqlitePool;

use crate::database::utils::{generate_uuid_token, get_timestamp};
use shared::types::review::{ReviewCreateData, ReviewRecord};

/// Insert a review of `book_id` written by `user_id`.
pub async fn create_review(
    pool: &SqlitePool,
    data: &ReviewCreateData,
    user_id: &str,
    book_id: &str,
) -> sqlx::Result<ReviewRecord> {
    let id = generate_uuid_token();
    let now = get_timestamp();

    sqlx::query(
        "INSERT INTO reviews (id, rating, review_text, user_id, book_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(&id)
    .bind(data.rating)
    .bind(&data.review_text)
    .bind(user_id)
    .bind(book_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(ReviewRecord {
        id,
        rating: data.rating,
        review_text: data.review_text.clone(),
        user_id: user_id.to_string(),
        book_id: book_id.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// All reviews of a book, newest first.
pub async fn reviews_for_book(pool: &SqlitePool, book_id: &str) -> sqlx::Result<Vec<ReviewRecord>> {
    let rows: Vec<(String, i64, String, String, String, i64, i64)> = sqlx::query_as(
        "SELECT id, rating, review_text, user_id, book_id, created_at, updated_at
         FROM reviews WHERE book_id = ?1 ORDER BY created_at DESC",
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, rating, review_text, user_id, book_id, created_at, updated_at)| ReviewRecord {
                id,
                rating,
                review_text,
                user_id,
                book_id,
                created_at,
                updated_at,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::books::create_book;
    use crate::database::create::open_memory_pool;
    use crate::database::users::{create_user, NewUser};
    use shared::types::book::BookCreateData;

    async fn fixture() -> (SqlitePool, String, String) {
        let pool = open_memory_pool().await.unwrap();
        let user = create_user(
            &pool,
            NewUser {
                username: "critic".to_string(),
                email: "critic@example.com".to_string(),
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
                title: "Neuromancer".to_string(),
                author: "William Gibson".to_string(),
                publisher: "Ace".to_string(),
                page_count: 271,
                language: "English".to_string(),
                published_date: "1984-07-01".to_string(),
            },
            &user.id,
        )
        .await
        .unwrap();
        (pool, user.id, book.id)
    }

    #[tokio::test]
    async fn create_and_list_reviews() {
        let (pool, user_id, book_id) = fixture().await;

        let review = create_review(
            &pool,
            &ReviewCreateData {
                rating: 5,
                review_text: "Still the blueprint.".to_string(),
            },
            &user_id,
            &book_id,
        )
        .await
        .unwrap();
        assert_eq!(review.rating, 5);
        assert_eq!(review.book_id, book_id);

        let listed = reviews_for_book(&pool, &book_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].review_text, "Still the blueprint.");
        assert!(reviews_for_book(&pool, "other-book").await.unwrap().is_empty());
    }
}
