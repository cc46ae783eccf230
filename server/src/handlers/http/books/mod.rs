use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use crate::database::{books as db_books, reviews as db_reviews, tags as db_tags, utils as db_utils};
use crate::handlers::http::utils::{body, json_response};
use crate::AppState;

use shared::types::book::{BookCreateData, BookDetails, BookUpdateData};
use shared::types::jwt::TokenClaims;

/// List every book in the catalogue.
pub async fn handle_list_books(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match db_books::list_books(&state.db).await {
        Ok(books) => json_response::deliver_success_json(Some(books)),
        Err(e) => {
            error!("Database error listing books: {}", e);
            database_error()
        }
    }
}

/// List books submitted by the user named in the path.
pub async fn handle_list_user_books(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    // /api/v1/books/user/:user_id
    let Some(user_id) = req.uri().path().split('/').nth(5).map(str::to_string) else {
        return bad_request("Invalid user id");
    };

    match db_books::list_user_books(&state.db, &user_id).await {
        Ok(books) => json_response::deliver_success_json(Some(books)),
        Err(e) => {
            error!("Database error listing user books: {}", e);
            database_error()
        }
    }
}

/// Fetch one book together with its tags and reviews.
pub async fn handle_get_book(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let Some(book_id) = req.uri().path().split('/').nth(4).map(str::to_string) else {
        return bad_request("Invalid book id");
    };

    let book = match db_books::get_book(&state.db, &book_id).await {
        Ok(Some(book)) => book,
        Ok(None) => return book_not_found(),
        Err(e) => {
            error!("Database error fetching book: {}", e);
            return database_error();
        }
    };

    let tags = match db_tags::tags_for_book(&state.db, &book_id).await {
        Ok(tags) => tags,
        Err(e) => {
            error!("Database error fetching book tags: {}", e);
            return database_error();
        }
    };

    let reviews = match db_reviews::reviews_for_book(&state.db, &book_id).await {
        Ok(reviews) => reviews,
        Err(e) => {
            error!("Database error fetching book reviews: {}", e);
            return database_error();
        }
    };

    json_response::deliver_success_json(Some(BookDetails {
        book,
        tags,
        reviews,
    }))
}

/// Add a book, owned by the authenticated user.
pub async fn handle_create_book(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let bytes = body::collect_body(req).await?;
    let data: BookCreateData = match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(e) => {
            warn!("Book create body rejected: {}", e);
            return bad_request("Invalid book data");
        }
    };

    if data.title.trim().is_empty() || data.author.trim().is_empty() {
        return bad_request("Title and author are required");
    }
    if data.page_count <= 0 {
        return bad_request("Page count must be positive");
    }
    if !db_utils::is_valid_iso_date(&data.published_date) {
        return bad_request("Published date must be YYYY-MM-DD");
    }

    match db_books::create_book(&state.db, &data, &claims.user.user_id).await {
        Ok(book) => {
            info!("Book created: {} ({})", book.title, book.id);
            json_response::deliver_serialized_json(
                &serde_json::json!({ "status": "success", "data": book }),
                StatusCode::CREATED,
            )
        }
        Err(e) => {
            error!("Database error creating book: {}", e);
            database_error()
        }
    }
}

/// Partially update a book. Absent fields are left untouched.
pub async fn handle_update_book(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let Some(book_id) = req.uri().path().split('/').nth(4).map(str::to_string) else {
        return bad_request("Invalid book id");
    };

    let bytes = body::collect_body(req).await?;
    let data: BookUpdateData = match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(e) => {
            warn!("Book update body rejected: {}", e);
            return bad_request("Invalid book data");
        }
    };

    if let Some(date) = &data.published_date {
        if !db_utils::is_valid_iso_date(date) {
            return bad_request("Published date must be YYYY-MM-DD");
        }
    }
    if let Some(count) = data.page_count {
        if count <= 0 {
            return bad_request("Page count must be positive");
        }
    }

    match db_books::update_book(&state.db, &book_id, &data).await {
        Ok(Some(book)) => json_response::deliver_success_json(Some(book)),
        Ok(None) => book_not_found(),
        Err(e) => {
            error!("Database error updating book: {}", e);
            database_error()
        }
    }
}

/// Delete a book and, via cascades, its tags links and reviews.
pub async fn handle_delete_book(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let Some(book_id) = req.uri().path().split('/').nth(4).map(str::to_string) else {
        return bad_request("Invalid book id");
    };

    match db_books::delete_book(&state.db, &book_id).await {
        Ok(true) => {
            info!("Book deleted: {}", book_id);
            json_response::deliver_success_json::<()>(None)
        }
        Ok(false) => book_not_found(),
        Err(e) => {
            error!("Database error deleting book: {}", e);
            database_error()
        }
    }
}

// ── Shared error shapes ──────────────────────────────────────────────────────

fn bad_request(message: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
}

fn book_not_found() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json("NOT_FOUND", "Book not found", StatusCode::NOT_FOUND)
}

fn database_error() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json(
        "DATABASE_ERROR",
        "Database error occurred",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
