use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCreateData {
    /// 1 to 5 inclusive.
    pub rating: i64,
    pub review_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: String,
    pub rating: i64,
    pub review_text: String,
    pub user_id: String,
    pub book_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}
