//! Wire types for the upload endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful upload: the absolute URL the stored file is reachable at.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the uploaded file
    #[schema(example = "https://img.example.com/uploads/avatars/d41d8cd98f00b204_1719500000.jpg")]
    pub url: String,
}

/// Error payload shared by every failing response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of what went wrong
    #[schema(example = "Unsupported file type")]
    pub error: String,
}
