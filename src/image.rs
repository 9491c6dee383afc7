//! Recipe image references.
//!
//! Remote images are stored as their URL. Local image files are not copied
//! anywhere: they are registered for the lifetime of the process and the
//! recipe stores a `blob:` reference to that registration. The reference
//! string survives a restart, the registration does not, so a persisted
//! blob reference resolves to nothing in a later process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::VaultError;

/// Scheme prefix for process-lifetime image references.
pub const BLOB_PREFIX: &str = "blob:recipe-vault/";

const REMOTE_PREFIXES: [&str; 4] = ["http://", "https://", "data:", "blob:"];

/// Where a recipe image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    LocalFile(PathBuf),
}

impl ImageSource {
    /// Classify user input: URL-like strings are remote, anything else is a file path.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if REMOTE_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            Some(ImageSource::Remote(trimmed.to_owned()))
        } else {
            Some(ImageSource::LocalFile(PathBuf::from(trimmed)))
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ImageSource::Remote(url) => url.trim().is_empty(),
            ImageSource::LocalFile(path) => path.as_os_str().is_empty(),
        }
    }
}

/// Process-lifetime registry mapping `blob:` references to local files.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    blobs: HashMap<String, PathBuf>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn an image source into the reference string stored on the recipe.
    pub fn reference_for(&mut self, source: &ImageSource) -> Result<String, VaultError> {
        match source {
            ImageSource::Remote(url) => Ok(url.clone()),
            ImageSource::LocalFile(path) => {
                if !path.is_file() {
                    return Err(VaultError::ImageFileNotFound { path: path.clone() });
                }
                let reference = format!("{BLOB_PREFIX}{}", uuid::Uuid::new_v4());
                tracing::debug!(path = %path.display(), reference = %reference, "registered image blob");
                self.blobs.insert(reference.clone(), path.clone());
                Ok(reference)
            }
        }
    }

    /// Local file behind a blob reference, if it was registered by this process.
    pub fn resolve(&self, reference: &str) -> Option<&Path> {
        self.blobs.get(reference).map(PathBuf::as_path)
    }

    /// Returns `true` when `reference` points at something displayable right now.
    pub fn is_available(&self, reference: &str) -> bool {
        !is_blob_reference(reference) || self.resolve(reference).is_some()
    }

    /// Drop the registration behind `reference`, if any.
    pub fn release(&mut self, reference: &str) {
        self.blobs.remove(reference);
    }
}

pub fn is_blob_reference(reference: &str) -> bool {
    reference.starts_with(BLOB_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifies_urls_as_remote() {
        assert_eq!(
            ImageSource::parse("https://picsum.photos/200"),
            Some(ImageSource::Remote("https://picsum.photos/200".into()))
        );
        assert_eq!(
            ImageSource::parse(" data:image/png;base64,AAAA "),
            Some(ImageSource::Remote("data:image/png;base64,AAAA".into()))
        );
    }

    #[test]
    fn parse_treats_other_text_as_file() {
        assert_eq!(
            ImageSource::parse("photos/cake.jpg"),
            Some(ImageSource::LocalFile(PathBuf::from("photos/cake.jpg")))
        );
    }

    #[test]
    fn parse_empty_is_none() {
        assert_eq!(ImageSource::parse(""), None);
        assert_eq!(ImageSource::parse("   "), None);
    }

    #[test]
    fn remote_reference_is_url_itself() {
        let mut reg = ImageRegistry::new();
        let r = reg
            .reference_for(&ImageSource::Remote("https://x/y.png".into()))
            .unwrap();
        assert_eq!(r, "https://x/y.png");
        assert!(reg.is_available(&r));
    }

    #[test]
    fn local_file_gets_blob_reference() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("cake.jpg");
        std::fs::write(&img, b"jpeg").unwrap();

        let mut reg = ImageRegistry::new();
        let r = reg.reference_for(&ImageSource::LocalFile(img.clone())).unwrap();
        assert!(is_blob_reference(&r));
        assert_eq!(reg.resolve(&r), Some(img.as_path()));
        assert!(reg.is_available(&r));
    }

    #[test]
    fn blob_reference_unavailable_in_fresh_registry() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("cake.jpg");
        std::fs::write(&img, b"jpeg").unwrap();

        let r = ImageRegistry::new()
            .reference_for(&ImageSource::LocalFile(img))
            .unwrap();

        let restarted = ImageRegistry::new();
        assert!(restarted.resolve(&r).is_none());
        assert!(!restarted.is_available(&r));
    }

    #[test]
    fn missing_local_file_is_rejected() {
        let mut reg = ImageRegistry::new();
        let err = reg
            .reference_for(&ImageSource::LocalFile(PathBuf::from("/no/such/img.png")))
            .unwrap_err();
        assert!(matches!(err, VaultError::ImageFileNotFound { .. }));
    }

    #[test]
    fn release_forgets_blob() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.png");
        std::fs::write(&img, b"png").unwrap();

        let mut reg = ImageRegistry::new();
        let r = reg.reference_for(&ImageSource::LocalFile(img)).unwrap();
        reg.release(&r);
        assert!(reg.resolve(&r).is_none());
    }
}
