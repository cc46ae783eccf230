use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use crate::database::{books as db_books, tags as db_tags};
use crate::handlers::http::utils::{body, json_response};
use crate::AppState;

use shared::types::jwt::TokenClaims;
use shared::types::tag::{TagAddData, TagCreateData};

/// List all tags.
pub async fn handle_list_tags(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match db_tags::list_tags(&state.db).await {
        Ok(tags) => json_response::deliver_success_json(Some(tags)),
        Err(e) => {
            error!("Database error listing tags: {}", e);
            database_error()
        }
    }
}

/// Create a tag with a unique name.
pub async fn handle_create_tag(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let bytes = body::collect_body(req).await?;
    let data: TagCreateData = match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(e) => {
            warn!("Tag create body rejected: {}", e);
            return bad_request("Invalid tag data");
        }
    };

    let name = data.name.trim();
    if name.is_empty() {
        return bad_request("Tag name is required");
    }

    match db_tags::get_tag_by_name(&state.db, name).await {
        Ok(Some(_)) => {
            return json_response::deliver_error_json(
                "TAG_EXISTS",
                "A tag with this name already exists",
                StatusCode::CONFLICT,
            );
        }
        Ok(None) => {}
        Err(e) => {
            error!("Database error checking tag name: {}", e);
            return database_error();
        }
    }

    match db_tags::create_tag(&state.db, name).await {
        Ok(tag) => {
            info!("Tag created: {} ({})", tag.name, tag.id);
            json_response::deliver_serialized_json(
                &serde_json::json!({ "status": "success", "data": tag }),
                StatusCode::CREATED,
            )
        }
        Err(e) => {
            error!("Database error creating tag: {}", e);
            database_error()
        }
    }
}

/// Attach a batch of tags to a book, creating any that do not exist yet.
pub async fn handle_add_tags_to_book(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    // /api/v1/tags/book/:book_id
    let Some(book_id) = req.uri().path().split('/').nth(5).map(str::to_string) else {
        return bad_request("Invalid book id");
    };

    let bytes = body::collect_body(req).await?;
    let data: TagAddData = match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(e) => {
            warn!("Tag attach body rejected: {}", e);
            return bad_request("Invalid tag data");
        }
    };

    let names: Vec<String> = data
        .tags
        .iter()
        .map(|t| t.name.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return bad_request("At least one tag name is required");
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
            error!("Database error fetching book for tag attach: {}", e);
            return database_error();
        }
    }

    match db_tags::attach_tags_to_book(&state.db, &book_id, &names).await {
        Ok(tags) => json_response::deliver_success_json(Some(tags)),
        Err(e) => {
            error!("Database error attaching tags: {}", e);
            database_error()
        }
    }
}

/// Rename a tag.
pub async fn handle_update_tag(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let Some(tag_id) = req.uri().path().split('/').nth(4).map(str::to_string) else {
        return bad_request("Invalid tag id");
    };

    let bytes = body::collect_body(req).await?;
    let data: TagCreateData = match serde_json::from_slice(&bytes) {
        Ok(data) => data,
        Err(e) => {
            warn!("Tag update body rejected: {}", e);
            return bad_request("Invalid tag data");
        }
    };

    let name = data.name.trim();
    if name.is_empty() {
        return bad_request("Tag name is required");
    }

    match db_tags::update_tag(&state.db, &tag_id, name).await {
        Ok(Some(tag)) => json_response::deliver_success_json(Some(tag)),
        Ok(None) => tag_not_found(),
        Err(e) => {
            error!("Database error updating tag: {}", e);
            database_error()
        }
    }
}

/// Delete a tag everywhere.
pub async fn handle_delete_tag(
    req: Request<hyper::body::Incoming>,
    state: AppState,
    _claims: TokenClaims,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let Some(tag_id) = req.uri().path().split('/').nth(4).map(str::to_string) else {
        return bad_request("Invalid tag id");
    };

    match db_tags::delete_tag(&state.db, &tag_id).await {
        Ok(true) => {
            info!("Tag deleted: {}", tag_id);
            json_response::deliver_success_json::<()>(None)
        }
        Ok(false) => tag_not_found(),
        Err(e) => {
            error!("Database error deleting tag: {}", e);
            database_error()
        }
    }
}

// ── Shared error shapes ──────────────────────────────────────────────────────

fn bad_request(message: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
}

fn tag_not_found() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json("NOT_FOUND", "Tag not found", StatusCode::NOT_FOUND)
}

fn database_error() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    json_response::deliver_error_json(
        "DATABASE_ERROR",
        "Database error occurred",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}
