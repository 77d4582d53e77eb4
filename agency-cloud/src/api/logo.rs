//! Agency logo upload
//!
//! POST /api/agencies/{id}/logo — multipart `file` → validate → fit 512×512 → PNG → SHA256 → S3
//!
//! Objects are stored at `logos/{agency_id}/{hash}.png` and served from
//! `LOGO_PUBLIC_BASE_URL`.

use std::io::Cursor;

use axum::extract::{Multipart, Path, State};
use axum::Extension;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use sha2::{Digest, Sha256};
use shared::ApiResponse;
use shared::error::{AppError, ErrorCode};
use shared::models::Agency;

use crate::auth::{ClientIp, UserIdentity};
use crate::db;
use crate::services::access::managed_agency;
use crate::state::AppState;

use super::{ApiResult, audit};

/// Maximum upload size (5MB)
pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;

/// Longest side after resizing
const LOGO_MAX_DIMENSION: u32 = 512;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

fn s3_logo_key(agency_id: i64, hash: &str) -> String {
    format!("logos/{agency_id}/{hash}.png")
}

/// Read the `file` field of a multipart body
pub(super) async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::with_message(ErrorCode::InvalidRequest, format!("Read error: {e}")))?;
            return Ok((file_name, bytes.to_vec()));
        }
    }
    Err(AppError::new(ErrorCode::NoFileProvided))
}

/// Validate, decode, downscale and re-encode as PNG
pub fn process_logo(file_name: &str, data: &[u8]) -> Result<Vec<u8>, AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_LOGO_BYTES {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large: {} bytes (max {MAX_LOGO_BYTES})", data.len()),
        ));
    }

    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!("Unsupported format: {ext}. Supported: png, jpg, jpeg, webp"),
        ));
    }

    let img = image::load_from_memory(data)
        .map_err(|e| AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image: {e}")))?;

    let img = if img.width() > LOGO_MAX_DIMENSION || img.height() > LOGO_MAX_DIMENSION {
        img.resize(LOGO_MAX_DIMENSION, LOGO_MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        img
    };

    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(img.to_rgba8())
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| AppError::with_message(ErrorCode::InternalError, format!("PNG encoding failed: {e}")))?;
    Ok(buffer)
}

/// POST /api/agencies/{id}/logo
pub async fn upload_logo(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<Agency> {
    managed_agency(&state.pool, &identity, id).await?;

    let (file_name, data) = read_file_field(&mut multipart).await?;
    let png = process_logo(&file_name, &data)?;

    let hash = hex::encode(Sha256::digest(&png));
    let key = s3_logo_key(id, &hash);

    // Idempotent: same hash = same content
    state
        .logos
        .s3
        .put_object()
        .bucket(&state.logos.bucket)
        .key(&key)
        .body(png.into())
        .content_type("image/png")
        .cache_control("public, max-age=31536000, immutable")
        .send()
        .await
        .map_err(|e| {
            tracing::error!(agency_id = id, hash = %hash, error = %e, "S3 logo upload failed");
            AppError::new(ErrorCode::FileStorageFailed)
        })?;

    let logo_url = format!("{}/{key}", state.logos.public_base_url.trim_end_matches('/'));
    let now = shared::util::now_millis();
    db::agencies::set_logo(&state.pool, id, &logo_url, now).await?;

    tracing::info!(agency_id = id, hash = %hash, "Agency logo uploaded");
    audit(
        &state,
        Some(&identity.user_id),
        "logo_uploaded",
        "agency",
        &id.to_string(),
        Some(serde_json::json!({ "logo_url": logo_url })),
        &ip,
    )
    .await;

    let agency = db::agencies::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::AgencyNotFound)?;
    Ok(ApiResponse::success(agency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 30, 30, 255]));
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_large_logo_is_downscaled_keeping_aspect() {
        let out = process_logo("logo.png", &png_bytes(1024, 256)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (512, 128));
    }

    #[test]
    fn test_small_logo_kept() {
        let out = process_logo("logo.PNG", &png_bytes(100, 80)).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 80));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(process_logo("a.png", &[]).unwrap_err().code, ErrorCode::EmptyFile);
        assert_eq!(
            process_logo("a.gif", &png_bytes(4, 4)).unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            process_logo("a.png", b"definitely not an image").unwrap_err().code,
            ErrorCode::InvalidImageFile
        );
        let too_big = vec![0u8; MAX_LOGO_BYTES + 1];
        assert_eq!(process_logo("a.png", &too_big).unwrap_err().code, ErrorCode::FileTooLarge);
    }

    #[test]
    fn test_s3_key() {
        assert_eq!(s3_logo_key(7, "abc"), "logos/7/abc.png");
    }
}
