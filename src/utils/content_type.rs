/// Only this many leading characters are inspected for a data-URL header.
const SNIFF_PREFIX_LEN: usize = 20;

pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Data-URL markers and the MIME type each one maps to, checked in order.
const DATA_URL_MARKERS: [(&str, &str); 5] = [
    ("data:image/jpeg", "image/jpeg"),
    ("data:image/jpg", "image/jpeg"),
    ("data:image/png", "image/png"),
    ("data:image/gif", "image/gif"),
    ("data:image/webp", "image/webp"),
];

/// Infers an image MIME type from the data-URL header of a base64 payload.
///
/// Raw base64 without a header, or an unknown subtype, yields `image/jpeg`.
pub fn sniff_content_type(base64: &str) -> &'static str {
    let header: String = base64.chars().take(SNIFF_PREFIX_LEN).collect();

    DATA_URL_MARKERS
        .iter()
        .find(|(marker, _)| header.contains(marker))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Canonical file extension for a content type.
pub fn file_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Drops a `data:...,` header, keeping everything after the first comma.
pub fn strip_data_url_prefix(base64: &str) -> &str {
    match base64.split_once(',') {
        Some((_, rest)) => rest,
        None => base64,
    }
}
