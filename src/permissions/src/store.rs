//! Permission store: authoritative in-memory state plus persistence
//!
//! The store owns every role profile and the change log. Reads go through
//! [`PermissionStore::engine`]; writes go through the mutation methods
//! (`update_permission`, `hide_module`, ...), which persist after every
//! change.
//!
//! Persistence is best-effort. A failed write is reported through `tracing`
//! and [`PersistenceStats`] but never rolls back the in-memory change. A
//! failed read is treated as "no prior state" and reseeds the defaults.

use crate::audit::{ChangeLog, ChangeLogEntry, ChangeLogFilter};
use crate::backend::KeyValueBackend;
use crate::defaults::default_profile;
use crate::engine::PermissionEngine;
use crate::error::{PermissionError, Result};
use crate::types::{ProfileMap, Role, RolePermissionProfile};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default backend key for the profile map
pub const DEFAULT_PERMISSIONS_KEY: &str = "ems_permissions_v1";

/// Default backend key for the change log
pub const DEFAULT_LOG_KEY: &str = "ems_permissions_log_v1";

/// Default export format version
pub const DEFAULT_EXPORT_VERSION: &str = "1.0.0";

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend key holding the serialized profile map
    pub permissions_key: String,

    /// Backend key holding the serialized change log
    pub log_key: String,

    /// Version stamped into exports
    pub export_version: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            permissions_key: DEFAULT_PERMISSIONS_KEY.to_string(),
            log_key: DEFAULT_LOG_KEY.to_string(),
            export_version: DEFAULT_EXPORT_VERSION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `EMS_PERMISSIONS_KEY` and `EMS_PERMISSIONS_LOG_KEY`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("EMS_PERMISSIONS_KEY") {
            if !key.is_empty() {
                config.permissions_key = key;
            }
        }

        if let Ok(key) = std::env::var("EMS_PERMISSIONS_LOG_KEY") {
            if !key.is_empty() {
                config.log_key = key;
            }
        }

        config
    }
}

/// Outcome counters for backend traffic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    /// Successful key writes
    pub writes: u64,

    /// Failed key writes
    pub write_failures: u64,

    /// Failed or undecodable key reads
    pub read_failures: u64,

    /// Most recent persistence error message
    pub last_error: Option<String>,
}

/// Authoritative holder of profiles and change log
pub struct PermissionStore {
    backend: Arc<dyn KeyValueBackend>,
    config: StoreConfig,
    pub(crate) profiles: ProfileMap,
    pub(crate) log: ChangeLog,
    stats: PersistenceStats,
}

impl PermissionStore {
    /// Create an empty, uninitialized store
    ///
    /// Until [`initialize`](Self::initialize) runs the store holds no
    /// profiles, so every non-admin check is denied.
    pub fn new(backend: Arc<dyn KeyValueBackend>, config: StoreConfig) -> Self {
        Self {
            backend,
            config,
            profiles: ProfileMap::new(),
            log: ChangeLog::new(),
            stats: PersistenceStats::default(),
        }
    }

    /// Create a store and run [`initialize`](Self::initialize)
    pub fn open(backend: Arc<dyn KeyValueBackend>, config: StoreConfig) -> Self {
        let mut store = Self::new(backend, config);
        store.initialize();
        store
    }

    /// Load persisted state, seeding default profiles if none exist
    pub fn initialize(&mut self) {
        if let Err(e) = self.load() {
            warn!("Started without part of the prior permission state: {}", e);
        }
    }

    /// Replace in-memory state with what the backend holds
    ///
    /// Each key is loaded independently. A profile map that is absent,
    /// empty or unreadable is replaced by the default profiles for every
    /// role, which are then persisted; a log that is absent or unreadable
    /// starts empty. The first read failure is returned after both keys
    /// have been attempted.
    pub fn load(&mut self) -> Result<()> {
        let permissions_key = self.config.permissions_key.clone();
        let log_key = self.config.log_key.clone();

        let profiles = self.read_key::<ProfileMap>(&permissions_key);
        let entries = self.read_key::<Vec<ChangeLogEntry>>(&log_key);

        let mut first_error = None;

        let profiles = match profiles {
            Ok(Some(profiles)) if !profiles.is_empty() => Some(profiles),
            Ok(_) => None,
            Err(e) => {
                first_error = Some(e);
                None
            }
        };

        self.log = match entries {
            Ok(entries) => ChangeLog::from_entries(entries.unwrap_or_default()),
            Err(e) => {
                first_error.get_or_insert(e);
                ChangeLog::new()
            }
        };

        match profiles {
            Some(profiles) => {
                self.profiles = profiles;
                info!(
                    "Loaded {} permission profiles and {} change log entries",
                    self.profiles.len(),
                    self.log.len()
                );
            }
            None => self.seed_defaults(),
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Write profiles and change log to the backend
    ///
    /// Both keys are attempted; the first failure is returned.
    pub fn save(&mut self) -> Result<()> {
        let permissions_key = self.config.permissions_key.clone();
        let log_key = self.config.log_key.clone();

        let profiles = serde_json::to_string(&self.profiles);
        let profiles_result = self.write_key(&permissions_key, profiles);

        let log = serde_json::to_string(&self.log);
        let log_result = self.write_key(&log_key, log);

        profiles_result.and(log_result)
    }

    /// End the store's lifecycle with a final save and backend flush
    pub fn teardown(mut self) -> Result<()> {
        self.save()?;
        if let Err(e) = self.backend.flush() {
            self.record_write_failure(&e);
            return Err(e);
        }
        info!("Permission store torn down");
        Ok(())
    }

    /// Read-only query view over the current profiles
    pub fn engine(&self) -> PermissionEngine<'_> {
        PermissionEngine::new(&self.profiles)
    }

    pub fn profiles(&self) -> &ProfileMap {
        &self.profiles
    }

    pub fn profile(&self, role: Role) -> Option<&RolePermissionProfile> {
        self.profiles.get(&role)
    }

    pub fn log(&self) -> &ChangeLog {
        &self.log
    }

    /// Change log entries matching `filter`, in append order
    pub fn change_log(&self, filter: &ChangeLogFilter) -> Vec<ChangeLogEntry> {
        self.log.query(filter)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn stats(&self) -> &PersistenceStats {
        &self.stats
    }

    fn seed_defaults(&mut self) {
        self.profiles = Role::ALL
            .into_iter()
            .map(|role| (role, default_profile(role)))
            .collect();
        info!("Seeded default permission profiles for {} roles", Role::ALL.len());

        if let Err(e) = self.save() {
            error!("Failed to persist default permission profiles: {}", e);
        }
    }

    /// Persist after a mutation; failures are reported, never propagated
    pub(crate) fn persist(&mut self) {
        if let Err(e) = self.save() {
            error!("Permission change applied in memory but not persisted: {}", e);
        }
    }

    fn read_key<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        let raw = match self.backend.get(key) {
            Ok(raw) => raw,
            Err(e) => {
                let err = PermissionError::PersistenceRead {
                    key: key.to_string(),
                    message: e.to_string(),
                };
                self.record_read_failure(&err);
                return Err(err);
            }
        };

        let Some(raw) = raw else {
            debug!("No stored value for key '{}'", key);
            return Ok(None);
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            let err = PermissionError::PersistenceRead {
                key: key.to_string(),
                message: e.to_string(),
            };
            self.record_read_failure(&err);
            err
        })
    }

    fn write_key(&mut self, key: &str, serialized: serde_json::Result<String>) -> Result<()> {
        let result = serialized
            .map_err(PermissionError::from)
            .and_then(|value| self.backend.set(key, &value))
            .map_err(|e| PermissionError::PersistenceWrite {
                key: key.to_string(),
                message: e.to_string(),
            });

        match result {
            Ok(()) => {
                self.stats.writes += 1;
                debug!("Persisted key '{}'", key);
                Ok(())
            }
            Err(e) => {
                self.record_write_failure(&e);
                Err(e)
            }
        }
    }

    fn record_read_failure(&mut self, err: &PermissionError) {
        warn!("{}", err);
        self.stats.read_failures += 1;
        self.stats.last_error = Some(err.to_string());
    }

    fn record_write_failure(&mut self, err: &PermissionError) {
        error!("{}", err);
        self.stats.write_failures += 1;
        self.stats.last_error = Some(err.to_string());
    }
}
