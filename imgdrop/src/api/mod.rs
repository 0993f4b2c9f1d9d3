//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Uploads** (`POST /api/v1/uploads`): Authenticated multipart image upload
//! - **Files** (`GET /uploads/*`): Static serving of previously uploaded files
//! - **Health** (`GET /healthz`): Liveness probe
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
