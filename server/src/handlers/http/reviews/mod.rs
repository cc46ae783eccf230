use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use crate::database::{books as db_books, reviews as db_reviews};
use crate::handlers::http::utils::{body, json_response};
use crate::AppState;

use shared::types::jwt::TokenClaims;
use shared::types::review::ReviewCreateData;

/// List all reviews of a book, newest first.
pub async fn handle_list_reviews(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    // /api/v1/reviews/book/:book_id
    let Some(book_id) = req.uri().path().split('/').nth(5).map(str::to_string) else {
        return bad_request("Invalid book id");
    };

    match db_reviews::reviews_for_book(&state.db, &book_id).await {
        Ok(reviews) => json_response::deliver_success_json(Some(reviews)),
        Err(e) => {
            error!("Database error listing reviews: {}", e);
            database_error()
        }
    }
}

/// Review a book as the authenticated user.
pub async fn handle_add_review(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let Some(book_id) = req.uri().path().split('/').nth(5).map(str::to_string) else {
        return bad_request("Invalid book id");
    };

    let bytes = body::collect_body(req).await?;
    let data: ReviewCreateData = match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(e) => {
            warn!("Review body rejected: {}", e);
            return bad_request("Invalid review data");
        }
    };

    if !(1..=5).contains(&data.rating) {
        return bad_request("Rating must be between 1 and 5");
    }

    match db_books::get_book(&state.db, &book_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return json_response::deliver_error_json(
                "NOT_FOUND",
                "Book not found",
                StatusCode::NOT_FOUND,
            );
        }
        Err(e) => {
            error!("Database error fetching book for review: {}", e);
            return database_error();
        }
    }

    match db_reviews::create_review(&state.db, &data, &claims.user.user_id, &book_id).await {
        Ok(review) => {
            info!("Review created for book {}: {}", book_id, review.id);
            json_response::deliver_serialized_json(
                &serde_json::json!({ "status": "success", "data": review }),
                StatusCode::CREATED,
            )
        }
        Err(e) => {
            error!("Database error creating review: {}", e);
            database_error()
        }
    }
}

// ── Shared error shapes ──────────────────────────────────────────────────────

fn bad_request(message: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
}

fn database_error() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json(
        "DATABASE_ERROR",
        "Database error occurred",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
