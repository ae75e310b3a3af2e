//! Content-type sniffing for uploaded sticker bytes.
//!
//! The client-declared `Content-Type` is never trusted; the allowlist is
//! matched against what the bytes actually are. Raster formats are detected
//! by magic bytes via [`image::guess_format`]. SVG is XML text with no magic
//! number, so it gets a small document probe instead.

/// MIME types accepted for sticker uploads
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// How far into the payload the SVG probe looks for the root element
const SVG_PROBE_BYTES: usize = 4096;

/// Sniff the content type of an uploaded payload.
///
/// Returns the detected MIME type if and only if it is in
/// [`ALLOWED_MIME_TYPES`]; anything else (unknown bytes, or a recognized but
/// disallowed format like BMP) yields `None`.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if let Ok(format) = image::guess_format(bytes) {
        let mime = format.to_mime_type();
        return if ALLOWED_MIME_TYPES.contains(&mime) { Some(mime) } else { None };
    }

    if looks_like_svg(bytes) {
        return Some("image/svg+xml");
    }

    None
}

/// Check whether the payload is an SVG document.
///
/// Accepts an optional UTF-8 BOM, leading whitespace, and XML prolog or
/// comments before the root element, but requires an `<svg` root tag within
/// the probe window.
fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_PROBE_BYTES)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    trimmed.starts_with('<') && trimmed.contains("<svg")
}
