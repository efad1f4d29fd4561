//! Where the door configuration document comes from.
//!
//! The controller serves its configuration over plain request/response
//! calls, which are outside this crate. A [`ConfigSource`] hides how the
//! document is obtained; the session only needs its text.
//!
//! This trait uses native `async fn` (edition 2024) and is therefore not
//! object-safe. Use it through generics:
//!
//! ```
//! use pacsis_panel::ConfigSource;
//!
//! async fn door_count<S: ConfigSource>(source: &S) -> usize {
//!     source.fetch().await.map(|doc| doc.matches("\"Id\"").count()).unwrap_or(0)
//! }
//! ```

#![allow(async_fn_in_trait)]

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors raised while obtaining a configuration document
#[derive(Debug, Error)]
pub enum ConfigSourceError {
    /// The source has nothing to give
    #[error("Configuration unavailable: {0}")]
    Unavailable(String),

    /// Reading the backing file failed
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Provider of the door configuration document.
pub trait ConfigSource: Send + Sync {
    /// Fetch the current document text.
    async fn fetch(&self) -> Result<String, ConfigSourceError>;
}

/// Configuration read from a file on every fetch.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    async fn fetch(&self) -> Result<String, ConfigSourceError> {
        debug!(path = %self.path.display(), "Reading door configuration");
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigSourceError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Fixed in-memory document, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    document: Option<String>,
}

impl StaticConfigSource {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
        }
    }

    /// A source that always fails.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl ConfigSource for StaticConfigSource {
    async fn fetch(&self) -> Result<String, ConfigSourceError> {
        self.document
            .clone()
            .ok_or_else(|| ConfigSourceError::Unavailable("no document".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"Id":"D1"}}]"#).unwrap();

        let source = FileConfigSource::new(file.path());
        assert_eq!(source.fetch().await.unwrap(), r#"[{"Id":"D1"}]"#);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileConfigSource::new(dir.path().join("doors.json"));
        assert!(matches!(
            source.fetch().await,
            Err(ConfigSourceError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticConfigSource::new("[]");
        assert_eq!(source.fetch().await.unwrap(), "[]");
        let source = StaticConfigSource::unavailable();
        assert!(source.fetch().await.is_err());
    }
}
