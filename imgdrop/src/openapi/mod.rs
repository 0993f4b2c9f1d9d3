//! OpenAPI documentation configuration.
//!
//! The generated document is served interactively at `/docs`.

use crate::api;
use crate::api::models::uploads::{ErrorResponse, UploadResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "imgdrop",
        description = "Authenticated image upload service. Accepts JPEG, PNG and WebP \
                       uploads over multipart forms and serves them back as static files."
    ),
    paths(api::handlers::uploads::upload),
    components(schemas(UploadResponse, ErrorResponse)),
    tags(
        (name = "uploads", description = "Image upload"))
)]
pub struct ApiDoc;
