//! Bounded change log for permission mutations
//!
//! Every successful mutation appends exactly one [`ChangeLogEntry`]. The log
//! keeps the most recent [`MAX_LOG_ENTRIES`] records and evicts from the
//! oldest end.

use crate::types::{Module, ParseIdError, PermissionKind, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hard cap on retained change log entries
pub const MAX_LOG_ENTRIES: usize = 1000;

/// Kind of state change recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    PermissionUpdate,
    ModuleHidden,
    ModuleShown,
    AllPermissionsGranted,
    AllPermissionsRevoked,
    RolePermissionsReset,
    PermissionsImported,
}

impl ChangeType {
    pub const ALL: [ChangeType; 7] = [
        ChangeType::PermissionUpdate,
        ChangeType::ModuleHidden,
        ChangeType::ModuleShown,
        ChangeType::AllPermissionsGranted,
        ChangeType::AllPermissionsRevoked,
        ChangeType::RolePermissionsReset,
        ChangeType::PermissionsImported,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::PermissionUpdate => "permission_update",
            ChangeType::ModuleHidden => "module_hidden",
            ChangeType::ModuleShown => "module_shown",
            ChangeType::AllPermissionsGranted => "all_permissions_granted",
            ChangeType::AllPermissionsRevoked => "all_permissions_revoked",
            ChangeType::RolePermissionsReset => "role_permissions_reset",
            ChangeType::PermissionsImported => "permissions_imported",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = ParseIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ChangeType::ALL
            .into_iter()
            .find(|change_type| change_type.as_str() == value)
            .ok_or_else(|| ParseIdError::new("change type", value))
    }
}

/// Immutable audit record of one state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    /// What kind of change was made
    #[serde(rename = "type")]
    pub change_type: ChangeType,

    /// Affected role (absent for whole-state imports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<Module>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<PermissionKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<bool>,

    pub timestamp: DateTime<Utc>,

    /// Identifier of the actor who made the change
    pub changed_by: String,
}

impl ChangeLogEntry {
    /// Create an entry stamped with the current time
    pub fn new(change_type: ChangeType, user_role: Option<Role>, changed_by: impl Into<String>) -> Self {
        Self {
            change_type,
            user_role,
            module_id: None,
            permission: None,
            old_value: None,
            new_value: None,
            timestamp: Utc::now(),
            changed_by: changed_by.into(),
        }
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.module_id = Some(module);
        self
    }

    /// Record a single flag transition
    pub fn with_values(mut self, permission: PermissionKind, old_value: bool, new_value: bool) -> Self {
        self.permission = Some(permission);
        self.old_value = Some(old_value);
        self.new_value = Some(new_value);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Conjunctive filter over change log entries
///
/// Unset criteria match everything; the time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLogFilter {
    pub user_role: Option<Role>,
    pub change_type: Option<ChangeType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ChangeLogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_role(mut self, role: Role) -> Self {
        self.user_role = Some(role);
        self
    }

    pub fn of_type(mut self, change_type: ChangeType) -> Self {
        self.change_type = Some(change_type);
        self
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Check if an entry satisfies every set criterion
    pub fn matches(&self, entry: &ChangeLogEntry) -> bool {
        if let Some(role) = self.user_role {
            if entry.user_role != Some(role) {
                return false;
            }
        }

        if let Some(change_type) = self.change_type {
            if entry.change_type != change_type {
                return false;
            }
        }

        if let Some(start) = self.start {
            if entry.timestamp < start {
                return false;
            }
        }

        if let Some(end) = self.end {
            if entry.timestamp > end {
                return false;
            }
        }

        true
    }
}

/// Append-only change log capped at [`MAX_LOG_ENTRIES`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeLog {
    entries: Vec<ChangeLogEntry>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from stored entries, applying the cap
    pub fn from_entries(entries: Vec<ChangeLogEntry>) -> Self {
        let mut log = Self { entries };
        log.truncate_oldest();
        log
    }

    /// Append an entry, evicting the oldest ones past the cap
    pub fn append(&mut self, entry: ChangeLogEntry) {
        self.entries.push(entry);
        self.truncate_oldest();
    }

    /// Entries matching `filter`, in append order
    pub fn query(&self, filter: &ChangeLogFilter) -> Vec<ChangeLogEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> &[ChangeLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn truncate_oldest(&mut self) {
        if self.entries.len() > MAX_LOG_ENTRIES {
            let excess = self.entries.len() - MAX_LOG_ENTRIES;
            self.entries.drain(0..excess);
        }
    }
}
