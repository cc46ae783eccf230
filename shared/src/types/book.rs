use serde::{Deserialize, Serialize};

use crate::types::review::ReviewRecord;
use crate::types::tag::TagRecord;

// ---------------------------------------------------------------------------
// Book wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BookCreateData {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub page_count: i64,
    pub language: String,
    /// ISO date, `YYYY-MM-DD`.
    pub published_date: String,
}

/// Partial update — absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookUpdateData {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<i64>,
    pub language: Option<String>,
    pub published_date: Option<String>,
}

/// A full `books` row as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub page_count: i64,
    pub language: String,
    pub published_date: String,
    /// UUID of the submitting user.
    pub user_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Book plus its attached tags and reviews (detail endpoint).
#[derive(Debug, Clone, Serialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: BookRecord,
    pub tags: Vec<TagRecord>,
    pub reviews: Vec<ReviewRecord>,
}
