//! Maintenance page catalog.
//!
//! # Responsibilities
//! - Expand content glob patterns into candidate files
//! - Determine each file's MIME type (extension first, then sniffing)
//! - Keep one file per MIME type
//!
//! # Design Decisions
//! - Built once, read-only afterwards
//! - Matches are sorted per pattern so duplicate resolution is reproducible
//! - First file for a MIME type wins; later ones are logged and skipped
//! - Unreadable or unknown files never fail the build, bad patterns do

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::maintenance::media_type::MediaType;
use crate::maintenance::sniff;

/// Error type for catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid content pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// A maintenance page and the media type it is served as.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub media_type: MediaType,
    pub path: PathBuf,
}

/// Mapping from media type to maintenance page, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from glob patterns, processed in the given order.
    pub fn build<S: AsRef<str>>(patterns: &[S]) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let matches = glob::glob(pattern).map_err(|source| CatalogError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;

            let mut paths = Vec::new();
            for entry in matches {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => {
                        tracing::warn!(path = ?e.path(), error = %e.error(), "Skipping unreadable content path");
                    }
                }
            }
            if paths.is_empty() {
                tracing::warn!(pattern = %pattern, "Content pattern matched no files");
            }
            paths.sort();

            for path in paths {
                catalog.add_file(&path);
            }
        }

        tracing::info!(entries = catalog.len(), "Maintenance catalog built");
        Ok(catalog)
    }

    fn add_file(&mut self, path: &Path) {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(path = ?path, "Skipping directory");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Skipping unreadable file");
                return;
            }
        }

        let media_type = match detect_media_type(path) {
            Ok(Some(media_type)) => media_type,
            Ok(None) => {
                tracing::warn!(path = ?path, "Could not determine MIME type, skipping");
                return;
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to sniff MIME type, skipping");
                return;
            }
        };

        if self.insert(media_type.clone(), path.to_path_buf()) {
            tracing::info!(mime = %media_type, path = ?path, "Adding maintenance page");
        } else {
            tracing::warn!(mime = %media_type, path = ?path, "Duplicate maintenance page for MIME type, keeping the first");
        }
    }

    /// Insert an entry. Returns `false` and leaves the catalog untouched if
    /// the media type is already present.
    pub fn insert(&mut self, media_type: MediaType, path: PathBuf) -> bool {
        if self.get(&media_type).is_some() {
            return false;
        }
        self.entries.push(CatalogEntry { media_type, path });
        true
    }

    pub fn get(&self, media_type: &MediaType) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.media_type == *media_type)
    }

    /// Look up an entry by MIME string, e.g. `"Text/HTML"`.
    pub fn lookup(&self, mime: &str) -> Option<&CatalogEntry> {
        MediaType::parse(mime).and_then(|media_type| self.get(&media_type))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve a file's media type from its extension, falling back to its content.
pub fn detect_media_type(path: &Path) -> io::Result<Option<MediaType>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("html") => Ok(Some(MediaType::new("text", "html"))),
        Some("json") => Ok(Some(MediaType::new("application", "json"))),
        _ => Ok(sniff::sniff_file(path)?.and_then(MediaType::parse)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn pattern(dir: &TempDir, glob: &str) -> String {
        format!("{}/{}", dir.path().display(), glob)
    }

    #[test]
    fn test_build_detects_types() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("maintenance.html"), "<h1>Down</h1>").unwrap();
        fs::write(dir.path().join("maintenance.JSON"), "{}").unwrap();
        fs::write(dir.path().join("maintenance.img"), PNG).unwrap();
        fs::write(dir.path().join("maintenance.txt"), "Down").unwrap();
        fs::create_dir(dir.path().join("maintenance.d")).unwrap();

        let catalog = Catalog::build(&[pattern(&dir, "maintenance.*")]).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.lookup("text/html").unwrap().path,
            dir.path().join("maintenance.html")
        );
        assert_eq!(
            catalog.lookup("application/json").unwrap().path,
            dir.path().join("maintenance.JSON")
        );
        assert_eq!(
            catalog.lookup("image/png").unwrap().path,
            dir.path().join("maintenance.img")
        );
        assert!(catalog.lookup("text/plain").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entries_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.html"), "<h1>Down</h1>").unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing.png"), dir.path().join("broken.png"))
            .unwrap();

        let catalog = Catalog::build(&[pattern(&dir, "*")]).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("text/html").unwrap().path, dir.path().join("page.html"));
    }

    #[test]
    fn test_duplicate_keeps_first_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.html"), "b").unwrap();
        fs::write(dir.path().join("a.html"), "a").unwrap();

        let catalog = Catalog::build(&[pattern(&dir, "*.html")]).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("text/html").unwrap().path, dir.path().join("a.html"));
    }

    #[test]
    fn test_patterns_keep_configured_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.html"), "a").unwrap();
        fs::write(dir.path().join("z.html"), "z").unwrap();

        let catalog = Catalog::build(&[pattern(&dir, "z.html"), pattern(&dir, "a.html")]).unwrap();

        assert_eq!(catalog.lookup("text/html").unwrap().path, dir.path().join("z.html"));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::build(&[pattern(&dir, "missing.*")]).unwrap();
        assert!(catalog.is_empty());

        let catalog = Catalog::build::<String>(&[]).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_malformed_pattern_fails() {
        let dir = TempDir::new().unwrap();
        let err = Catalog::build(&[pattern(&dir, "[")]).unwrap_err();
        assert!(matches!(err, CatalogError::Pattern { .. }));
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut catalog = Catalog::default();
        assert!(catalog.insert(MediaType::new("text", "html"), "a.html".into()));
        assert!(!catalog.insert(MediaType::new("TEXT", "HTML"), "b.html".into()));
        assert_eq!(catalog.entries()[0].path, PathBuf::from("a.html"));
    }
}
