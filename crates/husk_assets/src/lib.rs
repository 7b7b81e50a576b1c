//! Asset index - read-only store of bundled web assets
//!
//! The shell serves the embedded application's files through a virtual URL
//! scheme instead of the filesystem. This crate owns the lookup side of that:
//! an [`AssetIndex`] answers whether a logical path exists in the bundle and
//! yields its bytes. Two stores are provided: [`EmbeddedAssets`] (bytes baked
//! into the binary, owned for the process lifetime) and [`DirAssets`] (a
//! directory root, used in dev mode).
//!
//! The index is read-only after startup and may be queried concurrently by
//! any number of in-flight requests.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ============================================================================
// Error Types with Structured Codes
// ============================================================================

/// Error codes for asset lookups (for machine-readable errors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AssetErrorCode {
    /// No asset matches the requested path
    NotFound = 1000,
    /// Asset located but unreadable
    Read = 1001,
}

/// Custom error type for asset lookups
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("[{code}] Asset not found: {path}")]
    NotFound { code: u32, path: String },

    #[error("[{code}] Failed to read asset {path}: {message}")]
    Read { code: u32, path: String, message: String },
}

impl AssetError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            code: AssetErrorCode::NotFound as u32,
            path: path.into(),
        }
    }

    pub fn read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            code: AssetErrorCode::Read as u32,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this is the not-found variant (as opposed to a read failure).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// Asset Index
// ============================================================================

/// Read-only store of bundled files addressable by logical path.
///
/// `read` is the primary lookup: the logical path relative to the bundle
/// root, case-preserved. `read_named` is the fallback lookup used by the
/// resolver when the literal path misses: a stem + extension query against
/// the bundle root only, never subdirectories.
pub trait AssetIndex: Send + Sync {
    /// Primary lookup by logical path relative to the bundle root.
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    /// Fallback lookup by stem and extension against the bundle root.
    /// An empty extension queries the bare stem.
    fn read_named(&self, stem: &str, extension: &str) -> Result<Vec<u8>, AssetError>;

    /// Whether the logical path is present in the bundle.
    fn contains(&self, path: &str) -> bool;

    /// Whether the bytes live in the binary rather than on disk.
    fn is_embedded(&self) -> bool;
}

fn root_name(stem: &str, extension: &str) -> Option<String> {
    // Root query only: a stem that still carries separators is not addressable
    // through the fallback path.
    if stem.is_empty() || stem.contains('/') || extension.contains('/') {
        return None;
    }
    if extension.is_empty() {
        Some(stem.to_string())
    } else {
        Some(format!("{stem}.{extension}"))
    }
}

// ============================================================================
// Embedded Store
// ============================================================================

/// Bundle baked into the binary as an in-memory map.
///
/// Keys are logical paths relative to the bundle root, `/`-separated, with no
/// leading separator. The map owns the canonical bytes for the process
/// lifetime; reads hand out an independent copy.
pub struct EmbeddedAssets {
    entries: HashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedAssets {
    pub fn new(entries: HashMap<String, Cow<'static, [u8]>>) -> Self {
        Self { entries }
    }

    /// Build from `(path, bytes)` pairs, e.g. `include_bytes!` output.
    pub fn from_pairs<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, Cow<'static, [u8]>)>,
        P: Into<String>,
    {
        Self {
            entries: pairs.into_iter().map(|(p, b)| (p.into(), b)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssetIndex for EmbeddedAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.entries
            .get(path)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| AssetError::not_found(path))
    }

    fn read_named(&self, stem: &str, extension: &str) -> Result<Vec<u8>, AssetError> {
        let name = root_name(stem, extension)
            .ok_or_else(|| AssetError::not_found(format!("{stem}.{extension}")))?;
        self.read(&name)
    }

    fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn is_embedded(&self) -> bool {
        true
    }
}

// ============================================================================
// Filesystem Store
// ============================================================================

/// Bundle served from a directory root (dev mode).
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a logical path under the root. Callers (the resolver) have
    /// already normalized the path; anything that still looks like an escape
    /// attempt is treated as absent.
    fn locate(&self, path: &str) -> Option<PathBuf> {
        if path.is_empty()
            || path.starts_with('/')
            || path.split('/').any(|seg| seg == ".." || seg.is_empty())
        {
            return None;
        }
        Some(self.root.join(path))
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let file = match self.locate(path) {
            Some(file) if file.is_file() => file,
            _ => return Err(AssetError::not_found(path)),
        };
        std::fs::read(&file).map_err(|e| {
            tracing::warn!(path, error = %e, "asset present but unreadable");
            AssetError::read(path, e.to_string())
        })
    }
}

impl AssetIndex for DirAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.read_file(path)
    }

    fn read_named(&self, stem: &str, extension: &str) -> Result<Vec<u8>, AssetError> {
        let name = root_name(stem, extension)
            .ok_or_else(|| AssetError::not_found(format!("{stem}.{extension}")))?;
        self.read_file(&name)
    }

    fn contains(&self, path: &str) -> bool {
        self.locate(path).is_some_and(|file| file.is_file())
    }

    fn is_embedded(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded() -> EmbeddedAssets {
        EmbeddedAssets::from_pairs([
            ("index.html", Cow::Borrowed(b"<html></html>".as_slice())),
            ("js/main.js", Cow::Borrowed(b"export {};".as_slice())),
            ("icon.png", Cow::Borrowed(b"\x89PNG".as_slice())),
        ])
    }

    #[test]
    fn embedded_primary_lookup() {
        let index = embedded();
        assert_eq!(index.read("index.html").unwrap(), b"<html></html>");
        assert_eq!(index.read("js/main.js").unwrap(), b"export {};");
        assert!(index.contains("icon.png"));
        assert!(index.is_embedded());
    }

    #[test]
    fn embedded_missing_is_not_found() {
        let index = embedded();
        let err = index.read("nope.css").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("1000"));
        assert!(err.to_string().contains("nope.css"));
    }

    #[test]
    fn embedded_named_fallback_is_root_only() {
        let index = embedded();
        assert_eq!(index.read_named("icon", "png").unwrap(), b"\x89PNG");
        // Nested assets are not reachable through the flat fallback.
        assert!(index.read_named("js/main", "js").unwrap_err().is_not_found());
        assert!(index.read_named("main", "js").unwrap_err().is_not_found());
    }

    #[test]
    fn embedded_named_fallback_without_extension() {
        let index = EmbeddedAssets::from_pairs([(
            "LICENSE",
            Cow::Borrowed(b"MIT".as_slice()),
        )]);
        assert_eq!(index.read_named("LICENSE", "").unwrap(), b"MIT");
    }

    #[test]
    fn dir_primary_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("index.html"), b"<html>").unwrap();
        std::fs::write(dir.path().join("css/app.css"), b"body{}").unwrap();

        let index = DirAssets::new(dir.path());
        assert_eq!(index.read("index.html").unwrap(), b"<html>");
        assert_eq!(index.read("css/app.css").unwrap(), b"body{}");
        assert!(!index.is_embedded());
    }

    #[test]
    fn dir_rejects_escape_shapes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"<html>").unwrap();

        let index = DirAssets::new(dir.path());
        assert!(index.read("../index.html").unwrap_err().is_not_found());
        assert!(index.read("/etc/passwd").unwrap_err().is_not_found());
        assert!(index.read("").unwrap_err().is_not_found());
        assert!(!index.contains("css/../index.html"));
    }

    #[test]
    #[cfg(unix)]
    fn dir_unreadable_file_is_a_read_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.json");
        std::fs::write(&path, b"{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read(&path).is_ok() {
            // Permission bits don't bind this user (running as root).
            return;
        }

        let index = DirAssets::new(dir.path());
        let err = index.read("locked.json").unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("1001"));
        assert!(err.to_string().contains("locked.json"));
    }

    #[test]
    fn dir_directory_is_not_an_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();

        let index = DirAssets::new(dir.path());
        assert!(index.read("css").unwrap_err().is_not_found());
        assert!(!index.contains("css"));
    }

    #[test]
    fn dir_named_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("icon.png"), b"png").unwrap();

        let index = DirAssets::new(dir.path());
        assert_eq!(index.read_named("icon", "png").unwrap(), b"png");
        assert!(index.read_named("missing", "png").unwrap_err().is_not_found());
    }

    #[test]
    fn reads_are_idempotent() {
        let index = embedded();
        let first = index.read("index.html").unwrap();
        let second = index.read("index.html").unwrap();
        assert_eq!(first, second);
    }
}
