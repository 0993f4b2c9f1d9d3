use crate::AppState;
use crate::api::models::uploads::UploadResponse;
use crate::auth::verify_api_key;
use crate::errors::{Error, Result};
use crate::media::ImageKind;
use crate::storage::{StoredFile, sanitize_dir};
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header},
};

/// Buffered multipart form, collected before any validation runs.
///
/// Fields are buffered first so validation can run in a fixed order regardless
/// of how the client ordered the parts. In particular a missing or wrong
/// `apiKey` is always answered with 401, even when the file part is broken or
/// arrives first. Total memory is bounded by the request body limit installed
/// on the router.
#[derive(Default)]
struct UploadForm {
    api_key: Option<String>,
    dir: String,
    file: Option<Bytes>,
    /// First transport-level error hit while reading parts, reported only
    /// after the secret has been checked
    transport_error: Option<Error>,
}

impl UploadForm {
    async fn collect(mut multipart: Multipart) -> Self {
        let mut form = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    form.transport_error = Some(multipart_error(e));
                    break;
                }
            };

            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "apiKey" => match field.text().await {
                    Ok(value) => form.api_key = Some(value),
                    Err(e) => {
                        form.transport_error = Some(multipart_error(e));
                        break;
                    }
                },
                "dir" => match field.text().await {
                    Ok(value) => form.dir = value,
                    Err(e) => {
                        form.transport_error = Some(multipart_error(e));
                        break;
                    }
                },
                "file" => match field.bytes().await {
                    Ok(bytes) => form.file = Some(bytes),
                    Err(e) => {
                        form.transport_error = Some(multipart_error(e));
                        break;
                    }
                },
                // Unknown fields are ignored, matching lenient form handling
                _ => {}
            }
        }

        form
    }
}

/// Map a multipart read failure onto the response contract. Hitting the body
/// size limit mid-stream reads the same as an oversized file to the client.
fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::BadRequest {
            message: "File too large".to_string(),
        }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {e}"),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    tag = "uploads",
    summary = "Upload an image",
    description = "Upload a JPEG, PNG or WebP image. The payload is validated by its magic \
                   bytes, stored under a server-generated filename, and the public URL of \
                   the stored file is returned. Requires the shared secret in the `apiKey` \
                   form field.",
    request_body(
        content_type = "multipart/form-data",
        description = "Form fields: `apiKey` (required), `file` (required), `dir` (optional target subdirectory)"
    ),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Missing file, oversized payload, unsupported type or invalid directory", body = crate::api::models::uploads::ErrorResponse),
        (status = 401, description = "Missing or wrong apiKey", body = crate::api::models::uploads::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::api::models::uploads::ErrorResponse)
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let form = UploadForm::collect(multipart).await;

    // The secret is checked before anything else so probing requests learn
    // nothing about the rest of the pipeline
    let authenticated = match (&form.api_key, state.config.api_key.as_deref()) {
        (Some(provided), Some(expected)) => verify_api_key(provided, expected),
        _ => false,
    };
    if !authenticated {
        return Err(Error::Unauthenticated);
    }

    if let Some(err) = form.transport_error {
        return Err(err);
    }

    let bytes = form.file.ok_or_else(|| Error::BadRequest {
        message: "Missing file".to_string(),
    })?;

    if bytes.len() as u64 > state.config.uploads.max_file_size {
        return Err(Error::BadRequest {
            message: "File too large".to_string(),
        });
    }

    let kind = ImageKind::sniff(&bytes).ok_or_else(|| Error::BadRequest {
        message: "Unsupported file type".to_string(),
    })?;

    let dir = sanitize_dir(&form.dir)?.unwrap_or_else(|| state.config.uploads.default_dir.clone());

    let stored = state.store.store(&dir, kind.extension(), &bytes).await?;

    tracing::info!(
        dir = %stored.dir,
        filename = %stored.filename,
        size = bytes.len(),
        mime = kind.mime_type(),
        "File uploaded"
    );

    let url = public_url(&state, &headers, &stored);
    Ok(Json(UploadResponse { url }))
}

/// Build the public URL for a stored file.
///
/// When `public_base_url` is configured it wins. Otherwise the scheme comes
/// from `X-Forwarded-Proto` (set by the reverse proxy, defaulting to `http`)
/// and the authority from the request's `Host` header.
fn public_url(state: &AppState, headers: &HeaderMap, stored: &StoredFile) -> String {
    let public_path = &state.config.uploads.public_path;
    let relative = stored.relative_path();

    if let Some(base) = &state.config.public_base_url {
        return format!("{}{}/{}", base.as_str().trim_end_matches('/'), public_path, relative);
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{scheme}://{host}{public_path}/{relative}")
}
