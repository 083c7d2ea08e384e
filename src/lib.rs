//! Feedboard — a minimal tagged-post feed served over HTTP.

pub mod cases;
pub mod config;
pub mod error;
pub mod feed;
pub mod store;
