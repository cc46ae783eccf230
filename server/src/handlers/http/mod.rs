pub mod auth;
pub mod books;
pub mod reviews;
pub mod routes;
pub mod tags;
pub mod utils;
