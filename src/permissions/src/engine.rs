//! Read-only permission queries
//!
//! All checks share the same two rules:
//!
//! 1. `Role::Admin` is granted everything without consulting stored data.
//! 2. For other roles, a missing profile, a missing module entry or a hidden
//!    module denies; otherwise the stored flag decides.

use crate::types::{
    Module, ModuleInfo, ModulePermissionSet, PermissionKind, ProfileMap, Role,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;

/// Derived per-module view used to render overviews
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub hidden: bool,
    /// Number of kinds stored as granted (ignores the hidden override)
    pub permission_count: usize,
    pub can_view: bool,
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_export: bool,
}

impl From<&ModulePermissionSet> for ModuleSummary {
    fn from(set: &ModulePermissionSet) -> Self {
        Self {
            hidden: set.is_hidden,
            permission_count: set.granted_count(),
            can_view: set.view,
            can_add: set.add,
            can_edit: set.edit,
            can_delete: set.delete,
            can_export: set.export,
        }
    }
}

/// Overview of one role's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSummary {
    pub role: Role,
    /// Size of the module catalog
    pub total_modules: usize,
    /// Modules in the profile that are not hidden
    pub visible_modules: usize,
    pub permissions: BTreeMap<Module, ModuleSummary>,
}

/// Query view over a set of role profiles
#[derive(Debug, Clone, Copy)]
pub struct PermissionEngine<'a> {
    profiles: &'a ProfileMap,
}

impl<'a> PermissionEngine<'a> {
    pub fn new(profiles: &'a ProfileMap) -> Self {
        Self { profiles }
    }

    /// Stored record for a role and module, if any
    pub fn module_permissions(&self, role: Role, module: Module) -> Option<&'a ModulePermissionSet> {
        self.profiles.get(&role)?.modules.get(&module)
    }

    /// Check whether `role` may perform `kind` on `module`
    pub fn check_permission(&self, role: Role, module: Module, kind: PermissionKind) -> bool {
        if role.is_admin() {
            return true;
        }

        let allowed = match self.module_permissions(role, module) {
            Some(set) if !set.is_hidden => set.get(kind),
            _ => false,
        };

        trace!("check_permission role={} module={} kind={} -> {}", role, module, kind, allowed);
        allowed
    }

    /// Check whether `role` can see `module` at all
    pub fn can_view_module(&self, role: Role, module: Module) -> bool {
        if role.is_admin() {
            return true;
        }

        self.module_permissions(role, module)
            .map(|set| set.view && !set.is_hidden)
            .unwrap_or(false)
    }

    /// True when every kind is granted (vacuously true for no kinds)
    pub fn has_all_permissions(&self, role: Role, module: Module, kinds: &[PermissionKind]) -> bool {
        kinds.iter().all(|kind| self.check_permission(role, module, *kind))
    }

    /// True when at least one kind is granted
    pub fn has_any_permission(&self, role: Role, module: Module, kinds: &[PermissionKind]) -> bool {
        kinds.iter().any(|kind| self.check_permission(role, module, *kind))
    }

    /// Summarise the stored profile of `role`
    ///
    /// Reflects stored data only, so the admin summary shows what its
    /// profile holds rather than the bypass.
    pub fn summary(&self, role: Role) -> Option<PermissionSummary> {
        let profile = self.profiles.get(&role)?;

        let permissions: BTreeMap<Module, ModuleSummary> = profile
            .modules
            .iter()
            .map(|(module, set)| (*module, ModuleSummary::from(set)))
            .collect();

        let visible_modules = permissions.values().filter(|summary| !summary.hidden).count();

        Some(PermissionSummary {
            role,
            total_modules: Module::catalog().len(),
            visible_modules,
            permissions,
        })
    }

    /// Catalog entries `role` can view, in catalog order
    pub fn visible_modules(&self, role: Role) -> Vec<&'static ModuleInfo> {
        Module::catalog()
            .iter()
            .filter(|info| self.can_view_module(role, info.id))
            .collect()
    }
}
