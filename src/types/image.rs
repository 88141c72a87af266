//! Image loading for vision requests.

use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::wire::InlineData;
use crate::{Error, ErrorContext, Result};

/// MIME type assumed for base64 images that do not describe themselves.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

static DATA_URL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(image/[a-zA-Z0-9+.\-]+);base64,").expect("static data-url pattern")
});

/// Read an image file and encode it as inline data.
///
/// The MIME type is sniffed from the file's magic bytes, falling back to the
/// extension. Anything that does not resolve to `image/*` is rejected.
pub fn load_image_file(path: &Path) -> Result<InlineData> {
    if !path.is_file() {
        return Err(Error::invalid_input_with_context(
            format!("Image file not found: {}", path.display()),
            ErrorContext::new()
                .with_field_path("image_path")
                .with_source("vision_service"),
        ));
    }

    let bytes = std::fs::read(path)?;
    let mime_type = sniff_mime(&bytes)
        .or_else(|| guess_media_type(path))
        .filter(|m| m.starts_with("image/"))
        .ok_or_else(|| {
            Error::invalid_input_with_context(
                format!("Invalid image file: {}", path.display()),
                ErrorContext::new()
                    .with_field_path("image_path")
                    .with_details("expected an image/* MIME type")
                    .with_source("vision_service"),
            )
        })?;

    Ok(InlineData {
        mime_type,
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// Split an optional `data:<mime>;base64,` prefix off a base64 image.
pub fn parse_base64_image(encoded: &str) -> InlineData {
    match DATA_URL_PREFIX.captures(encoded) {
        Some(caps) => {
            let prefix_len = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let mime_type = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
            InlineData {
                mime_type,
                data: encoded[prefix_len..].to_string(),
            }
        }
        None => InlineData {
            mime_type: DEFAULT_IMAGE_MIME.to_string(),
            data: encoded.to_string(),
        },
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|k| k.mime_type().to_string())
}

fn guess_media_type(path: &Path) -> Option<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "bmp" => "image/bmp",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mt.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_data_url_prefix_is_parsed_and_stripped() {
        let parsed = parse_base64_image("data:image/jpeg;base64,/9j/4AAQ");
        assert_eq!(parsed.mime_type, "image/jpeg");
        assert_eq!(parsed.data, "/9j/4AAQ");
    }

    #[test]
    fn test_bare_base64_defaults_to_png() {
        let parsed = parse_base64_image("iVBORw0KGgo=");
        assert_eq!(parsed.mime_type, DEFAULT_IMAGE_MIME);
        assert_eq!(parsed.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_non_image_data_url_is_not_treated_as_prefix() {
        let raw = "data:text/plain;base64,SGVsbG8=";
        let parsed = parse_base64_image(raw);
        assert_eq!(parsed.mime_type, DEFAULT_IMAGE_MIME);
        assert_eq!(parsed.data, raw);
    }

    #[test]
    fn test_missing_file_is_invalid_input() {
        let err = load_image_file(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(err.to_string().contains("Image file not found"));
    }

    #[test]
    fn test_png_file_is_sniffed_and_encoded() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&PNG_HEADER).unwrap();
        file.write_all(&[0u8; 16]).unwrap();

        let inline = load_image_file(file.path()).unwrap();
        assert_eq!(inline.mime_type, "image/png");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(inline.data)
            .unwrap();
        assert_eq!(&decoded[..8], &PNG_HEADER);
    }

    #[test]
    fn test_text_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"just some notes").unwrap();

        let err = load_image_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid image file"));
    }
}
