pub mod board;
pub mod config;
pub mod error;
pub mod note;
pub mod store;
pub mod utils;
