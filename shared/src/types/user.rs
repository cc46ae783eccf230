use serde::{Deserialize, Serialize};

use crate::types::book::BookRecord;

/// Minimal identity summary returned alongside freshly issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub email: String,
    pub uid: String,
}

/// Public view of a `users` row — everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: i64,
}

/// User together with the books they submitted (profile endpoint).
#[derive(Debug, Clone, Serialize)]
pub struct UserWithBooks {
    #[serde(flatten)]
    pub user: UserPublic,
    pub books: Vec<BookRecord>,
}
