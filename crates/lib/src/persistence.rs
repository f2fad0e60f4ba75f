//! Persistence hooks for configuration documents.
//!
//! A document holds at most one [`PersistenceSink`]. After every successful
//! mutation the document marks itself dirty and, when the sink has auto-save
//! enabled, hands the canonical XML to [`PersistenceSink::save`] before the
//! mutating call returns. Sink errors propagate to the caller unchanged.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::{ConfigDocument, Result};

/// Errors raised while saving or loading documents
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// `save` was called on a document without a sink
    #[error("No persistence sink registered")]
    NoSink,

    /// Reading or writing the backing file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A caller-supplied sink rejected the document
    #[error("Save failed: {reason}")]
    SaveFailed { reason: String },
}

impl PersistenceError {
    /// Check if this error means no sink is registered
    pub fn is_no_sink(&self) -> bool {
        matches!(self, PersistenceError::NoSink)
    }

    /// Check if this error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, PersistenceError::Io { .. })
    }
}

impl From<PersistenceError> for crate::Error {
    fn from(err: PersistenceError) -> Self {
        crate::Error::Persistence(err)
    }
}

/// Destination for serialized documents.
///
/// Implementations receive the full canonical XML on every save.
pub trait PersistenceSink: Send {
    /// Writes `xml` to the backing store
    fn save(&mut self, xml: &str) -> Result<()>;

    /// Whether the document should save after every mutation
    fn auto_save(&self) -> bool;
}

/// A sink backed by a single file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    auto_save: bool,
}

impl FileStore {
    /// Creates a store for `path` with auto-save disabled
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            auto_save: false,
        }
    }

    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    pub fn set_auto_save(&mut self, auto_save: bool) {
        self.auto_save = auto_save;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the backing file.
    ///
    /// # Returns
    /// The parsed document, without a sink attached.
    ///
    /// # Errors
    /// `PersistenceError::Io` if the file cannot be read, or any load error
    /// raised by [`ConfigDocument::parse`].
    pub fn load(&self) -> Result<ConfigDocument> {
        let xml = fs::read_to_string(&self.path).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bytes = xml.len(), "loaded configuration file");
        ConfigDocument::parse(&xml)
    }

    /// Loads the backing file and registers this store as the document's sink
    pub fn open(self) -> Result<ConfigDocument> {
        let mut doc = self.load()?;
        doc.set_persistence(Box::new(self));
        Ok(doc)
    }
}

impl PersistenceSink for FileStore {
    fn save(&mut self, xml: &str) -> Result<()> {
        fs::write(&self.path, xml).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), bytes = xml.len(), "wrote configuration file");
        Ok(())
    }

    fn auto_save(&self) -> bool {
        self.auto_save
    }
}
