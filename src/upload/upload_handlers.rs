use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap},
    response::IntoResponse,
};

use crate::{
    dto::ok,
    error::{AppError, Result},
    state::AppState,
    upload::upload_storage::{UploadKind, UploadResponse},
};

fn public_url(state: &AppState, headers: &HeaderMap, relative_path: &str) -> String {
    let path = format!("/uploads/{}", relative_path);

    if let Some(base) = &state.config.public_base_url {
        return format!("{}{}", base.trim_end_matches('/'), path);
    }

    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, path),
        None => path,
    }
}

/// Upload a photo or audio recording as visit evidence
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = String, content_type = "multipart/form-data",
        description = "Fields: file, type (photo | audio), notification_id"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file, wrong type or too large")
    ),
    tag = "upload",
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut kind = UploadKind::Photo;
    let mut notification_id = String::from("unknown");
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                kind = value.trim().parse().map_err(AppError::BadRequest)?;
            }
            Some("notification_id") => {
                notification_id = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
            Some("file") => {
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some((content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (content_type, bytes) =
        file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let stored = state
        .upload_storage
        .save(kind, &notification_id, content_type.as_deref(), &bytes)
        .await?;

    Ok(ok(UploadResponse {
        url: public_url(&state, &headers, &stored.relative_path),
        filename: stored.filename,
        size: stored.size,
    }))
}
