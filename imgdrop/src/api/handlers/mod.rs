//! Axum route handlers for all API endpoints.

pub mod uploads;
