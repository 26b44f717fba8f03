//! # EMS Permission Engine
//!
//! Role × module × permission-kind access matrix with per-module visibility
//! overrides, a bounded audit trail and whole-state import/export.
//!
//! ## Features
//!
//! - **Closed catalogs** for roles, modules and permission kinds
//! - **Admin bypass**: every check for `admin` is granted regardless of stored data
//! - **Visibility overrides** that make a module's flags dormant without erasing them
//! - **Change log** capped at 1000 entries, filterable by role, type and time
//! - **Pluggable persistence** over any synchronous key-value backend
//!
//! This is a client-side convenience layer: it does not authenticate callers
//! and offers no tamper resistance.
//!
//! ## Example
//!
//! ```rust
//! use ems_permissions::{InMemoryBackend, Module, PermissionKind, PermissionStore, Role, StoreConfig};
//! use std::sync::Arc;
//!
//! let mut store = PermissionStore::open(Arc::new(InMemoryBackend::new()), StoreConfig::default());
//!
//! assert!(!store.engine().check_permission(Role::Manager, Module::Riders, PermissionKind::Delete));
//!
//! store
//!     .update_permission(Role::Manager, Module::Riders, PermissionKind::Delete, true, "admin1")
//!     .unwrap();
//!
//! assert!(store.engine().check_permission(Role::Manager, Module::Riders, PermissionKind::Delete));
//! ```

pub mod audit;
pub mod backend;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod guard;
mod mutation;
pub mod store;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use audit::{ChangeLog, ChangeLogEntry, ChangeLogFilter, ChangeType, MAX_LOG_ENTRIES};
pub use backend::{InMemoryBackend, KeyValueBackend};
#[cfg(feature = "sled-backend")]
pub use backend::SledBackend;
pub use engine::{ModuleSummary, PermissionEngine, PermissionSummary};
pub use error::{PermissionError, Result};
pub use guard::{ItemType, MenuItem, Section};
pub use store::{PermissionStore, PersistenceStats, StoreConfig};
pub use transfer::ExportBundle;
pub use types::{
    Module, ModuleInfo, ModuleMap, ModulePermissionSet, ParseIdError, PermissionKind, ProfileMap, Role,
    RolePermissionProfile,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
