//! Core permission matrix types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-role module permissions, keyed in catalog order
pub type ModuleMap = BTreeMap<Module, ModulePermissionSet>;

/// All stored role profiles
pub type ProfileMap = BTreeMap<Role, RolePermissionProfile>;

/// Failure to parse a role, module or permission kind from its identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseIdError {
    kind: &'static str,
    value: String,
}

impl ParseIdError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// User role
///
/// `Admin` bypasses every capability check; its stored profile is kept only
/// so that it can be exported, summarised and edited like the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Supervisor,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Supervisor];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Supervisor => "supervisor",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| ParseIdError::new("role", value))
    }
}

/// Functional area whose visibility and capabilities are governed per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Supervisors,
    Riders,
    Inventory,
    Orders,
    Reports,
    Deductions,
    Settings,
    PermissionsAdmin,
}

/// Catalog metadata for a module
///
/// `critical` is informational; the engine never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub id: Module,
    pub name: &'static str,
    pub icon: &'static str,
    pub critical: bool,
}

static CATALOG: [ModuleInfo; 9] = [
    ModuleInfo { id: Module::Dashboard, name: "Dashboard", icon: "📊", critical: true },
    ModuleInfo { id: Module::Supervisors, name: "Supervisors", icon: "👥", critical: false },
    ModuleInfo { id: Module::Riders, name: "Riders", icon: "🚴", critical: false },
    ModuleInfo { id: Module::Inventory, name: "Inventory", icon: "📦", critical: false },
    ModuleInfo { id: Module::Orders, name: "Orders", icon: "📋", critical: false },
    ModuleInfo { id: Module::Reports, name: "Reports", icon: "📈", critical: false },
    ModuleInfo { id: Module::Deductions, name: "Deductions", icon: "💰", critical: false },
    ModuleInfo { id: Module::Settings, name: "Settings", icon: "⚙️", critical: true },
    ModuleInfo { id: Module::PermissionsAdmin, name: "Permissions Admin", icon: "🔐", critical: true },
];

impl Module {
    /// Every catalog module, in catalog order
    pub const ALL: [Module; 9] = [
        Module::Dashboard,
        Module::Supervisors,
        Module::Riders,
        Module::Inventory,
        Module::Orders,
        Module::Reports,
        Module::Deductions,
        Module::Settings,
        Module::PermissionsAdmin,
    ];

    /// Full module catalog
    pub fn catalog() -> &'static [ModuleInfo] {
        &CATALOG
    }

    pub fn info(self) -> &'static ModuleInfo {
        // CATALOG is declared in the same order as the enum
        &CATALOG[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Supervisors => "supervisors",
            Module::Riders => "riders",
            Module::Inventory => "inventory",
            Module::Orders => "orders",
            Module::Reports => "reports",
            Module::Deductions => "deductions",
            Module::Settings => "settings",
            Module::PermissionsAdmin => "permissions_admin",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = ParseIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|module| module.as_str() == value)
            .ok_or_else(|| ParseIdError::new("module", value))
    }
}

/// Governed capability on a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    View,
    Add,
    Edit,
    Delete,
    Export,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 5] = [
        PermissionKind::View,
        PermissionKind::Add,
        PermissionKind::Edit,
        PermissionKind::Delete,
        PermissionKind::Export,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionKind::View => "view",
            PermissionKind::Add => "add",
            PermissionKind::Edit => "edit",
            PermissionKind::Delete => "delete",
            PermissionKind::Export => "export",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = ParseIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PermissionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseIdError::new("permission kind", value))
    }
}

/// Permissions of one role on one module
///
/// Kind flags default to `false` when absent from stored data, so a sparse
/// record loaded from an import never grants more than it states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePermissionSet {
    #[serde(default)]
    pub view: bool,

    #[serde(default)]
    pub add: bool,

    #[serde(default)]
    pub edit: bool,

    #[serde(default)]
    pub delete: bool,

    #[serde(default)]
    pub export: bool,

    /// Visibility override; while set, every kind reads as denied
    #[serde(default)]
    pub is_hidden: bool,

    /// Display override, opaque to the engine
    #[serde(default)]
    pub custom_name: Option<String>,
}

impl ModulePermissionSet {
    /// Create a visible set with the given kind flags
    pub fn new(view: bool, add: bool, edit: bool, delete: bool, export: bool) -> Self {
        Self {
            view,
            add,
            edit,
            delete,
            export,
            is_hidden: false,
            custom_name: None,
        }
    }

    /// Every kind granted
    pub fn full() -> Self {
        Self::new(true, true, true, true, true)
    }

    /// Every kind denied
    pub fn none() -> Self {
        Self::new(false, false, false, false, false)
    }

    /// Stored flag for `kind`, ignoring the hidden override
    pub fn get(&self, kind: PermissionKind) -> bool {
        match kind {
            PermissionKind::View => self.view,
            PermissionKind::Add => self.add,
            PermissionKind::Edit => self.edit,
            PermissionKind::Delete => self.delete,
            PermissionKind::Export => self.export,
        }
    }

    pub fn set(&mut self, kind: PermissionKind, value: bool) {
        match kind {
            PermissionKind::View => self.view = value,
            PermissionKind::Add => self.add = value,
            PermissionKind::Edit => self.edit = value,
            PermissionKind::Delete => self.delete = value,
            PermissionKind::Export => self.export = value,
        }
    }

    /// Set every kind flag, leaving overrides untouched
    pub fn set_all(&mut self, value: bool) {
        for kind in PermissionKind::ALL {
            self.set(kind, value);
        }
    }

    /// Number of kinds stored as granted
    pub fn granted_count(&self) -> usize {
        PermissionKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind))
            .count()
    }
}

/// Permission profile of a single role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionProfile {
    pub role: Role,

    pub modules: ModuleMap,

    #[serde(default = "default_active")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl RolePermissionProfile {
    /// Create an active profile stamped with the current time
    pub fn new(role: Role, modules: ModuleMap) -> Self {
        Self {
            role,
            modules,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
