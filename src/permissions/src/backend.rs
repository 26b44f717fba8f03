//! Key-value persistence backends
//!
//! The store persists two opaque JSON blobs (profiles and change log) under
//! fixed string keys. Any synchronous get/set surface can back it.

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Synchronous string key-value surface
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Flush buffered writes to durable storage
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory backend
///
/// Clones share the same underlying map, which lets tests inspect what a
/// store wrote or hand the same data to a second store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(feature = "sled-backend")]
pub use self::sled_backend::SledBackend;

#[cfg(feature = "sled-backend")]
mod sled_backend {
    use super::KeyValueBackend;
    use crate::error::{PermissionError, Result};
    use std::path::Path;
    use tracing::debug;

    /// On-disk backend over an embedded sled tree
    pub struct SledBackend {
        db: sled::Db,
    }

    impl SledBackend {
        /// Open (or create) a database at `path`
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();
            let db = sled::open(path)?;
            debug!("Opened sled permission database at {}", path.display());
            Ok(Self { db })
        }

        /// Database that is removed when dropped
        pub fn temporary() -> Result<Self> {
            let db = sled::Config::new().temporary(true).open()?;
            Ok(Self { db })
        }
    }

    impl KeyValueBackend for SledBackend {
        fn get(&self, key: &str) -> Result<Option<String>> {
            match self.db.get(key.as_bytes())? {
                Some(bytes) => String::from_utf8(bytes.to_vec())
                    .map(Some)
                    .map_err(|e| PermissionError::PersistenceRead {
                        key: key.to_string(),
                        message: format!("stored value is not UTF-8: {}", e),
                    }),
                None => Ok(None),
            }
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.db.insert(key.as_bytes(), value.as_bytes())?;
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            self.db.flush()?;
            Ok(())
        }
    }
}
