//! Uploaded files: multipart form collection and image thumbnails.
//!
//! Images are decoded, shrunk to fit their target box (aspect ratio kept)
//! and stored as WebP under `MEDIA_ROOT`. Paths saved on rows are relative
//! to that root.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use axum::extract::Multipart;
use image::{DynamicImage, ImageFormat};
use storybible_core::types::DbId;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    BookCover,
    CharacterProfile,
    WorldImage,
}

impl ImageTarget {
    /// Bounding box `(width, height)` of the stored image.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            ImageTarget::BookCover => (600, 900),
            ImageTarget::CharacterProfile => (400, 400),
            ImageTarget::WorldImage => (1200, 800),
        }
    }

    fn dir(self) -> &'static str {
        match self {
            ImageTarget::BookCover => "book_covers",
            ImageTarget::CharacterProfile => "character_profiles",
            ImageTarget::WorldImage => "world_images",
        }
    }
}

/// A multipart form with at most one file part.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// `(filename, bytes)` of the `file` part.
    pub file: Option<(String, Vec<u8>)>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await?;
                form.file = Some((filename, bytes.to_vec()));
            } else if !name.is_empty() {
                let text = field.text().await?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    pub fn take_file(&mut self) -> AppResult<(String, Vec<u8>)> {
        self.file
            .take()
            .filter(|(_, bytes)| !bytes.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

/// Shrink an image to fit `target` and re-encode it as WebP.
pub fn thumbnail(bytes: &[u8], target: ImageTarget) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(bytes).map_err(|e| AppError::BadRequest(format!("Unreadable image: {e}")))?;
    let (w, h) = target.bounds();
    let fitted = if img.width() > w || img.height() > h { img.thumbnail(w, h) } else { img };
    let resized = DynamicImage::ImageRgba8(fitted.to_rgba8());

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::WebP)
        .map_err(|e| AppError::InternalError(format!("Image encoding failed: {e}")))?;
    Ok(out.into_inner())
}

/// Thumbnail `bytes` and write them under `media_root`. Returns the
/// relative path to store on the row.
pub async fn store_image(media_root: &Path, target: ImageTarget, owner_id: DbId, bytes: Vec<u8>) -> AppResult<String> {
    let encoded = tokio::task::spawn_blocking(move || thumbnail(&bytes, target))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))??;

    let relative = format!("{}/{owner_id}_{}.webp", target.dir(), uuid::Uuid::new_v4().simple());
    let path = media_root.join(&relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
    }
    tokio::fs::write(&path, &encoded)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    tracing::debug!(path = %relative, bytes = encoded.len(), "Stored image");
    Ok(relative)
}

/// Best-effort removal of a replaced image.
pub async fn remove_image(media_root: &Path, relative: Option<&str>) {
    let Some(relative) = relative else { return };
    if let Err(e) = tokio::fs::remove_file(media_root.join(relative)).await {
        tracing::debug!(path = relative, error = %e, "Old image not removed");
    }
}
