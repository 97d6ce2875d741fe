//! Whole-document JSON persistence with file locking.
//!
//! Readers take a shared lock. Writers serialize into a temp file in the
//! same directory under an exclusive lock, sync it, and rename it over the
//! target, so a failed save never leaves a half-written document behind.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Load a document, or `None` when it is missing or unreadable.
///
/// Corrupt documents are logged and treated as absent.
pub fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("No document at {:?}", path);
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Treating as empty.", path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Treating as empty.", path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {:?}: {}. Treating as empty.", path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(doc) => {
            tracing::debug!("Loaded document from {:?}", path);
            Ok(Some(doc))
        }
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Treating as empty.", path, e);
            Ok(None)
        }
    }
}

/// Load a document, falling back to `T::default()`
pub fn load_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    Ok(load_optional(path)?.unwrap_or_default())
}

/// Atomically replace the document at `path`
pub fn save_document<T: Serialize + ?Sized>(path: &Path, doc: &T) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "document path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string_pretty(doc)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved document to {:?}", path);
    Ok(())
}

/// Load, modify and save a document. Nothing is written when `f` fails.
pub fn update_document<T, F>(path: &Path, f: F) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T) -> Result<()>,
{
    let mut doc = load_document::<T>(path)?;
    f(&mut doc)?;
    save_document(path, &doc)?;
    Ok(doc)
}
