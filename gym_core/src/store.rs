//! Document persistence with file locking.
//!
//! The engine only needs a synchronous get/set store. [`JsonFileStore`]
//! keeps the document as one JSON file, written atomically under an
//! exclusive lock; [`MemoryStore`] keeps it in memory.

use crate::{Document, Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Synchronous storage for the tracker document
pub trait DocumentStore {
    /// Load the stored document, or `None` if nothing usable is stored
    fn load(&self) -> Result<Option<Document>>;

    /// Replace the stored document
    fn save(&mut self, doc: &Document) -> Result<()>;

    /// Discard whatever is stored
    fn clear(&mut self) -> Result<()>;
}

/// JSON file store with advisory locking and atomic replacement
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for JsonFileStore {
    /// Load the document with a shared lock.
    ///
    /// A missing, unreadable or corrupted file is logged and treated as
    /// empty, so the session starts from defaults instead of failing.
    fn load(&self) -> Result<Option<Document>> {
        let path = &self.path;
        if !path.exists() {
            tracing::info!("No document found at {:?}, starting fresh", path);
            return Ok(None);
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open document {:?}: {}. Using defaults.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock document {:?}: {}. Using defaults.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read document {:?}: {}. Using defaults.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match Document::from_json(&contents) {
            Ok(doc) => {
                tracing::debug!("Loaded document from {:?}", path);
                Ok(Some(doc))
            }
            Err(e) => {
                tracing::warn!("Failed to parse document {:?}: {}. Using defaults.", path, e);
                Ok(None)
            }
        }
    }

    /// Save the document atomically
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames
    /// it over the original.
    fn save(&mut self, doc: &Document) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Other(format!("document path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(doc)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved document to {:?}", self.path);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Removed document {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Option<Document>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: Some(doc),
            saves: 0,
        }
    }

    /// Number of successful saves so far
    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn stored(&self) -> Option<&Document> {
        self.doc.as_ref()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<Document>> {
        Ok(self.doc.clone())
    }

    fn save(&mut self, doc: &Document) -> Result<()> {
        self.doc = Some(doc.clone());
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.doc = None;
        Ok(())
    }
}
