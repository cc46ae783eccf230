pub mod book;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod review;
pub mod server_config;
pub mod signup;
pub mod tag;
pub mod user;

pub use self::book::{BookCreateData, BookDetails, BookRecord, BookUpdateData};
pub use self::json_error::ErrorResponse;
pub use self::jwt::{TokenClaims, TokenUser};
pub use self::login::{LoginData, LoginError, LoginResponse};
pub use self::review::{ReviewCreateData, ReviewRecord};
pub use self::signup::{SignupData, SignupError, SignupResponse};
pub use self::tag::{TagAddData, TagCreateData, TagRecord};
pub use self::user::{UserPublic, UserSummary, UserWithBooks};
