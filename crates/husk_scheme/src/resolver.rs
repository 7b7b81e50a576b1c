//! Resource resolution - logical path to bundled bytes
//!
//! Resolution runs in two steps against the asset index: the normalized path
//! is tried literally first, then the final segment's stem + extension is
//! tried against the bundle root (assets addressable without their literal
//! relative path). The primary lookup always wins; the fallback is only
//! consulted after a primary miss.

use std::sync::Arc;

use husk_assets::AssetIndex;

use crate::{mime_for, SchemeError};

/// An asset resolved for one response. Immutable once constructed; the bytes
/// are an independent copy held for the duration of the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub logical_path: String,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl ResolvedAsset {
    fn new(logical_path: String, bytes: Vec<u8>) -> Self {
        let content_type = mime_for(&logical_path);
        Self {
            logical_path,
            bytes,
            content_type,
        }
    }
}

/// Resolves virtual-scheme request paths against an asset index.
pub struct ResourceResolver {
    index: Arc<dyn AssetIndex>,
}

impl ResourceResolver {
    pub fn new(index: Arc<dyn AssetIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &Arc<dyn AssetIndex> {
        &self.index
    }

    /// Resolve a raw request path to bundled bytes.
    ///
    /// The returned `NotFound` carries the original raw path for diagnostics,
    /// not the normalized form.
    pub fn resolve(&self, raw_path: &str) -> Result<ResolvedAsset, SchemeError> {
        let path = normalize(raw_path).ok_or_else(|| {
            tracing::warn!(raw_path, "rejected unresolvable request path");
            SchemeError::not_found(raw_path)
        })?;

        match self.index.read(&path) {
            Ok(bytes) => {
                tracing::debug!(path = %path, "resolved via primary lookup");
                return Ok(ResolvedAsset::new(path, bytes));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let (stem, extension) = name_and_extension(&path);
        match self.index.read_named(stem, extension) {
            Ok(bytes) => {
                tracing::debug!(path = %path, stem, extension, "resolved via fallback lookup");
                Ok(ResolvedAsset::new(path, bytes))
            }
            Err(e) if e.is_not_found() => Err(SchemeError::not_found(raw_path)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Normalize a raw request path: strip one leading separator, drop `.` and
/// empty segments, and refuse anything carrying a `..` segment. Returns
/// `None` when the path is empty after normalization or attempts traversal.
fn normalize(raw_path: &str) -> Option<String> {
    let stripped = raw_path.strip_prefix('/').unwrap_or(raw_path);

    let mut segments: Vec<&str> = Vec::new();
    for segment in stripped.split('/') {
        match segment {
            "" | "." => continue,
            // Traversal defense: never let a request climb toward the root,
            // whatever it would resolve to.
            ".." => return None,
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Split the final segment of a normalized path into stem and extension.
/// Dotfiles and extensionless names yield an empty extension.
fn name_and_extension(path: &str) -> (&str, &str) {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => (&file_name[..pos], &file_name[pos + 1..]),
        _ => (file_name, ""),
    }
}

// ============================================================================
// Tests
// ============================================================================
