//! Virtual scheme serving - `app://` requests resolved against the bundle
//!
//! The embedded application is loaded from `app://local/index.html` rather
//! than a `file://` URL so that ES-module imports are not blocked by
//! same-origin checks. This crate turns an incoming virtual-scheme URL into a
//! logical bundle path, resolves it against an [`husk_assets::AssetIndex`]
//! with a primary-then-fallback strategy, and builds the response (or a
//! structured failure) that the host hands back to the webview.
//!
//! Serving is per-task: the host wires each scheme request to a
//! [`SchemeTask`] callback object and may cancel it out of band. See
//! [`ContentServer`].

use std::path::Path;

pub mod resolver;
pub mod server;

pub use resolver::{ResolvedAsset, ResourceResolver};
pub use server::{ContentServer, ResourceProvider, SchemeTask, ServerResponse, TaskId};

/// The scheme the shell registers with its webview.
pub const VIRTUAL_SCHEME: &str = "app";

// ============================================================================
// Error Types with Structured Codes
// ============================================================================

/// Error codes for virtual-scheme serving (for machine-readable errors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SchemeErrorCode {
    /// Malformed scheme URL
    InvalidRequest = 2000,
    /// No asset matches, after both primary and fallback lookup
    NotFound = 2001,
    /// Asset located but unreadable
    Read = 2002,
}

/// Custom error type for virtual-scheme serving.
///
/// A request-level failure terminates only that request; nothing here is
/// fatal to the host process.
#[derive(Debug, thiserror::Error)]
pub enum SchemeError {
    #[error("[{code}] Invalid request: {message}")]
    InvalidRequest { code: u32, message: String },

    #[error("[{code}] Not found: {path}")]
    NotFound { code: u32, path: String },

    #[error("[{code}] Failed to read {path}: {message}")]
    Read { code: u32, path: String, message: String },
}

impl SchemeError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            code: SchemeErrorCode::InvalidRequest as u32,
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            code: SchemeErrorCode::NotFound as u32,
            path: path.into(),
        }
    }

    pub fn read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            code: SchemeErrorCode::Read as u32,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> SchemeErrorCode {
        match self {
            Self::InvalidRequest { .. } => SchemeErrorCode::InvalidRequest,
            Self::NotFound { .. } => SchemeErrorCode::NotFound,
            Self::Read { .. } => SchemeErrorCode::Read,
        }
    }
}

impl From<husk_assets::AssetError> for SchemeError {
    fn from(e: husk_assets::AssetError) -> Self {
        match e {
            husk_assets::AssetError::NotFound { path, .. } => Self::not_found(path),
            husk_assets::AssetError::Read { path, message, .. } => Self::read(path, message),
        }
    }
}

// ============================================================================
// Virtual Request
// ============================================================================

/// A parsed `app://<authority>/<path>` request.
///
/// The authority (`local` by convention) is carried for diagnostics but
/// otherwise ignored; only the path participates in resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRequest {
    pub authority: String,
    pub raw_path: String,
}

impl VirtualRequest {
    /// Parse a virtual-scheme URL. Anything that is not `app://…` is an
    /// [`SchemeError::InvalidRequest`].
    pub fn parse(url: &str) -> Result<Self, SchemeError> {
        let rest = url
            .strip_prefix("app://")
            .ok_or_else(|| SchemeError::invalid_request(format!("not an app:// URL: {url}")))?;

        let (authority, raw_path) = match rest.find('/') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };

        Ok(Self {
            authority: authority.to_string(),
            raw_path: raw_path.to_string(),
        })
    }
}

// ============================================================================
// MIME Mapping
// ============================================================================

/// Content type for a logical path, from the final extension only.
///
/// The extension match is case-insensitive; unknown extensions map to the
/// generic binary type. These exact values are part of the wire contract.
pub fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_request() {
        let req = VirtualRequest::parse("app://local/index.html").unwrap();
        assert_eq!(req.authority, "local");
        assert_eq!(req.raw_path, "index.html");
    }

    #[test]
    fn parses_nested_path_and_ignores_authority_value() {
        let req = VirtualRequest::parse("app://anything/js/main.js").unwrap();
        assert_eq!(req.authority, "anything");
        assert_eq!(req.raw_path, "js/main.js");
    }

    #[test]
    fn authority_only_yields_empty_path() {
        let req = VirtualRequest::parse("app://local").unwrap();
        assert_eq!(req.raw_path, "");
    }

    #[test]
    fn rejects_foreign_schemes() {
        for url in ["file:///etc/passwd", "https://example.com/", "app:/x", ""] {
            let err = VirtualRequest::parse(url).unwrap_err();
            assert_eq!(err.code(), SchemeErrorCode::InvalidRequest);
        }
    }

    #[test]
    fn mime_table_matches_contract() {
        assert_eq!(mime_for("index.html"), "text/html");
        assert_eq!(mime_for("style.css"), "text/css");
        assert_eq!(mime_for("main.js"), "application/javascript");
        assert_eq!(mime_for("data.json"), "application/json");
        assert_eq!(mime_for("icon.png"), "image/png");
        assert_eq!(mime_for("photo.jpg"), "image/jpeg");
        assert_eq!(mime_for("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for("logo.svg"), "image/svg+xml");
        assert_eq!(mime_for("font.woff"), "font/woff");
        assert_eq!(mime_for("font.woff2"), "font/woff2");
        assert_eq!(mime_for("font.ttf"), "font/ttf");
        assert_eq!(mime_for("blob.bin"), "application/octet-stream");
        assert_eq!(mime_for("noext"), "application/octet-stream");
    }

    #[test]
    fn mime_extension_is_case_insensitive() {
        assert_eq!(mime_for("INDEX.HTML"), "text/html");
        assert_eq!(mime_for("Photo.JPeG"), "image/jpeg");
    }

    #[test]
    fn error_display_carries_codes() {
        assert!(SchemeError::invalid_request("x").to_string().contains("2000"));
        assert!(SchemeError::not_found("a/b").to_string().contains("2001"));
        assert!(SchemeError::read("a", "denied").to_string().contains("2002"));
    }
}
