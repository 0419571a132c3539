//! Image type detection for downloaded bytes

use image::ImageFormat;

const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";

/// File extension for image bytes, or `None` when the content is not an
/// image format the game loads
///
/// JPEG is always reported as `jpg`.
pub fn image_extension(bytes: &[u8]) -> Option<&'static str> {
    // guess_format needs a full JFIF/EXIF marker; the game accepts any SOI
    if bytes.starts_with(JPEG_MAGIC) {
        return Some("jpg");
    }
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Tiff => Some("tiff"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_jpeg_is_jpg() {
        assert_eq!(image_extension(b"\xFF\xD8\xFF\xE0\0\x10JFIF\0"), Some("jpg"));
        assert_eq!(image_extension(b"\xFF\xD8\xFF\xDB"), Some("jpg"));
    }

    #[test]
    fn test_common_formats() {
        assert_eq!(image_extension(PNG_HEADER), Some("png"));
        assert_eq!(image_extension(b"GIF89a\x01\0\x01\0"), Some("gif"));
        assert_eq!(image_extension(b"BM\0\0\0\0\0\0\0\0"), Some("bmp"));
    }

    #[test]
    fn test_unknown_content() {
        assert_eq!(image_extension(b"<!DOCTYPE html><html>"), None);
        assert_eq!(image_extension(b""), None);
    }
}
