//! Session Storage

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::basket::{CartError, CartSession};

/// Key the cart session is stored under.
pub const STORAGE_KEY: &str = "cart-storage";

/// Version written into every stored envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors reading or writing stored sessions.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO error on the backing store
    #[error("Storage IO failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored text is not a valid envelope
    #[error("Stored session is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Envelope written by an incompatible version
    #[error("Stored session has schema version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version found in storage
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// Envelope decodes but its lines break the cart invariants
    #[error("Stored session is inconsistent: {0}")]
    Inconsistent(#[from] CartError),
}

/// Durable key/value text storage.
pub trait SessionStorage {
    /// Reads a value; `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the backing store fails.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the backing store fails.
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Deletes a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the backing store fails.
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Storage that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: FxHashMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);

        Ok(())
    }
}

/// Storage keeping each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store files under `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;

        // Readers never observe a partially written file.
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(key))?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    session: &'a CartSession,
}

#[derive(Deserialize)]
struct Envelope {
    session: CartSession,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Serializes a session into a versioned envelope.
///
/// # Errors
///
/// Returns [`PersistenceError::Json`] if serialization fails.
pub fn encode_session(session: &CartSession) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        session,
    })?)
}

/// Reads a session from a versioned envelope.
///
/// # Errors
///
/// - [`PersistenceError::UnsupportedVersion`]: the envelope has another version.
/// - [`PersistenceError::Json`]: the text is not a valid envelope.
/// - [`PersistenceError::Inconsistent`]: a line is in another currency, has a zero
///   quantity or a total that does not match its snapshot.
pub fn decode_session(text: &str) -> Result<CartSession, PersistenceError> {
    let VersionProbe { version } = serde_json::from_str(text)?;

    if version != SCHEMA_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: version,
            expected: SCHEMA_VERSION,
        });
    }

    let Envelope { session } = serde_json::from_str(text)?;

    session.check()?;

    Ok(session)
}
