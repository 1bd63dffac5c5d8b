//! Axum middleware

pub mod request_id;
