//! Normalization of uploaded images.
//!
//! Uploads arrive as raw bytes in whatever format the client had. Everything
//! stored (task attachments and profile avatars) is decoded and re-encoded
//! as PNG first, so the binary read endpoints can always serve `image/png`.

use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageOutputFormat};

use crate::error::AppError;

/// File extensions accepted for uploads, checked when the client names the
/// source file.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Avatars are cover-cropped to this square size.
pub const AVATAR_SIZE: u32 = 250;

/// Maximum accepted upload body sizes.
pub const AVATAR_MAX_BYTES: usize = 1_000_000;
pub const IMAGE_MAX_BYTES: usize = 1_500_000;

/// Validates an uploaded file name against the extension allow-list.
pub fn check_extension(filename: &str) -> Result<(), AppError> {
    let allowed = filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    if allowed {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Please upload an image (jpg, jpeg or png)".into(),
        ))
    }
}

/// Decodes uploaded bytes and re-encodes them as PNG.
///
/// Fails with a 400 when the bytes are not a decodable image.
pub fn normalize_to_png(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(bytes)?;
    encode_png(&img)
}

/// Avatar variant: cover-crops to a `size` x `size` square before encoding.
pub fn normalize_avatar(bytes: &[u8], size: u32) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(bytes)?.resize_to_fill(size, size, FilterType::Triangle);
    encode_png(&img)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, AppError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .map_err(|e| AppError::InternalServerError(format!("Failed to encode image: {}", e)))?;
    Ok(out.into_inner())
}
