use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreateData {
    pub name: String,
}

/// Payload for attaching a set of tags to a book; unknown names are created.
#[derive(Debug, Clone, Deserialize)]
pub struct TagAddData {
    pub tags: Vec<TagCreateData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}
