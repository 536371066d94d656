// brandforge: data URL encoding and mime helpers for logo assets

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// Encode bytes as a `data:{mime};base64,...` URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its mime type and decoded bytes.
///
/// Returns `None` for anything that is not `data:<mime>;base64,<payload>`.
pub fn decode_data_url(data_url: &str) -> Option<(String, Vec<u8>)> {
    let rest = data_url.trim().strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime.is_empty()
        || !mime
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '+' | '-' | '.'))
    {
        return None;
    }
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime.to_string(), bytes))
}

/// File extension for a stored logo: `svg`, `jpg`, otherwise `png`.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("svg") {
        "svg"
    } else if mime.contains("jpeg") || mime.contains("jpg") {
        "jpg"
    } else {
        "png"
    }
}

/// Guess an image mime type from a file name or URL path.
pub fn mime_for_path(path: &str) -> Option<&'static str> {
    let without_query = path.split(['?', '#']).next().unwrap_or(path);
    let ext = Path::new(without_query)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "svg" => Some("image/svg+xml"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "ico" => Some("image/x-icon"),
        _ => None,
    }
}

/// Whether `bytes` look like a decodable image of the declared type.
///
/// SVG is text, so it is checked for an `<svg` root; raster formats must
/// carry a magic number the `image` crate recognizes.
pub fn looks_like_image(bytes: &[u8], mime_type: &str) -> bool {
    if bytes.is_empty() {
        return false;
    }
    if mime_type.to_ascii_lowercase().contains("svg") {
        return String::from_utf8_lossy(bytes).contains("<svg");
    }
    image::guess_format(bytes).is_ok()
}
