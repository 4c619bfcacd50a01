//! Image type detection and fixed-size thumbnail generation.

use std::io::Cursor;

use image::ImageFormat;
use image::imageops::FilterType;

use super::StorageResult;

/// Bounding box of generated thumbnails, in pixels.
pub const THUMBNAIL_SIZE: u32 = 150;

/// Client extensions accepted for category images.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "svg"];

/// Content type of an uploaded image as detected from its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Bitmap format the thumbnail is re-encoded in.
    Raster(ImageFormat),
    /// Vector image; stored verbatim since it cannot be rasterized here.
    Svg,
}

/// Detect the image kind of `bytes`.
///
/// Raster formats are recognised by their magic bytes. SVG has no magic, so
/// it is only accepted when the client extension says `svg` and the document
/// contains an `<svg` element.
pub fn detect(bytes: &[u8], extension: &str) -> Option<ImageKind> {
    if extension.eq_ignore_ascii_case("svg") {
        let text = std::str::from_utf8(bytes).ok()?;
        return text.contains("<svg").then_some(ImageKind::Svg);
    }

    match image::guess_format(bytes).ok()? {
        format @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif) => {
            Some(ImageKind::Raster(format))
        }
        _ => None,
    }
}

/// Build the thumbnail bytes for an upload.
///
/// Rasters are scaled to fit inside [`THUMBNAIL_SIZE`] on both axes, keeping
/// the aspect ratio, and encoded in their source format.
pub fn make_thumbnail(bytes: &[u8], kind: ImageKind) -> StorageResult<Vec<u8>> {
    match kind {
        ImageKind::Svg => Ok(bytes.to_vec()),
        ImageKind::Raster(format) => {
            let img = image::load_from_memory_with_format(bytes, format)?;
            let resized = img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);
            let mut buf = Cursor::new(Vec::new());
            resized.write_to(&mut buf, format)?;
            Ok(buf.into_inner())
        }
    }
}
