pub mod books;
pub mod create;
pub mod reviews;
pub mod tags;
pub mod users;
pub mod utils;
