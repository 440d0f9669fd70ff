use std::path::PathBuf;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Evidence category, which decides validation and target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Audio,
}

impl UploadKind {
    pub fn dir(&self) -> &'static str {
        match self {
            UploadKind::Photo => "evidencias",
            UploadKind::Audio => "audios",
        }
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "photo" => Ok(UploadKind::Photo),
            "audio" => Ok(UploadKind::Audio),
            _ => Err("Invalid upload type. Use: photo, audio".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
}

/// A file written under the upload root.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Path below `/uploads`, e.g. `evidencias/<filename>`.
    pub relative_path: String,
    pub filename: String,
    pub size: usize,
}

/// Detects JPEG, PNG and WebP from their magic bytes.
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Keeps only `[A-Za-z0-9-]` so the id cannot escape the upload directory.
pub fn safe_id(notification_id: &str) -> String {
    let id: String = notification_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    if id.is_empty() {
        "unknown".to_string()
    } else {
        id
    }
}

#[derive(Debug, Clone)]
pub struct UploadStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl UploadStorage {
    pub fn new(root: PathBuf, max_bytes: usize) -> Self {
        Self { root, max_bytes }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Checks size and content, returning the file extension to store under.
    pub fn validate(
        &self,
        kind: UploadKind,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<&'static str> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("No file uploaded".to_string()));
        }

        if bytes.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {}MB",
                self.max_bytes / 1024 / 1024
            )));
        }

        match kind {
            UploadKind::Photo => sniff_image(bytes).ok_or_else(|| {
                AppError::BadRequest("Invalid file type. Allowed: JPEG, PNG, WebP".to_string())
            }),
            UploadKind::Audio => {
                let mime = content_type.unwrap_or_default();
                if mime.starts_with("audio/") || mime.starts_with("video/webm") {
                    Ok("webm")
                } else {
                    Err(AppError::BadRequest(
                        "Invalid file type. Allowed: audio recordings".to_string(),
                    ))
                }
            }
        }
    }

    pub fn file_name(notification_id: &str, ext: &str) -> String {
        format!(
            "{}_{}_{:08x}.{}",
            safe_id(notification_id),
            Utc::now().timestamp(),
            rand::random::<u32>(),
            ext
        )
    }

    pub async fn save(
        &self,
        kind: UploadKind,
        notification_id: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile> {
        let ext = self.validate(kind, content_type, bytes)?;
        let filename = Self::file_name(notification_id, ext);

        let dir = self.root.join(kind.dir());
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!("Failed to create upload directory {}: {:?}", dir.display(), e);
            AppError::InternalError
        })?;

        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("Failed to save file {}: {:?}", path.display(), e);
            AppError::InternalError
        })?;

        tracing::info!(filename = %filename, size = bytes.len(), "File uploaded");

        Ok(StoredFile {
            relative_path: format!("{}/{}", kind.dir(), filename),
            filename,
            size: bytes.len(),
        })
    }
}
