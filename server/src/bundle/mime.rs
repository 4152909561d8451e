//! Content type tables
//!
//! Panels use a small closed table; static assets get a wider one.

/// Reported for anything without a table entry
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Fixed panel table, keyed by lower-cased extension
static PANEL_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("html", "text/html"),
];

/// Content type for a panel extension. Never fails.
pub fn panel_content_type(extension: &str) -> &'static str {
    let ext = extension.to_ascii_lowercase();
    PANEL_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
        .unwrap_or(OCTET_STREAM)
}

/// Content type for a static asset, inferred from its extension
pub fn static_content_type(extension: Option<&str>) -> &'static str {
    let ext = extension.map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",

        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",

        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        Some("pdf") => "application/pdf",

        _ => OCTET_STREAM,
    }
}
