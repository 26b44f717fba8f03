//! Mutation API
//!
//! The only way to change stored permissions. Each operation validates its
//! target first, so a `RoleNotFound` or `ModuleNotFound` error leaves state
//! untouched. On success it applies the change, appends exactly one change
//! log entry and then persists.

use crate::audit::{ChangeLogEntry, ChangeType};
use crate::defaults::default_module_map;
use crate::error::{PermissionError, Result};
use crate::store::PermissionStore;
use crate::types::{Module, ModulePermissionSet, PermissionKind, Role, RolePermissionProfile};
use tracing::info;

impl PermissionStore {
    /// Set a single permission flag
    pub fn update_permission(
        &mut self,
        role: Role,
        module: Module,
        kind: PermissionKind,
        value: bool,
        actor: &str,
    ) -> Result<()> {
        let set = self.module_entry_mut(role, module)?;
        let old_value = set.get(kind);
        set.set(kind, value);

        info!(
            "Permission {}.{}.{} changed {} -> {} by {}",
            role, module, kind, old_value, value, actor
        );

        self.record(
            ChangeLogEntry::new(ChangeType::PermissionUpdate, Some(role), actor)
                .with_module(module)
                .with_values(kind, old_value, value),
        );
        Ok(())
    }

    /// Hide a module from a role, keeping its stored flags dormant
    pub fn hide_module(&mut self, role: Role, module: Module, actor: &str) -> Result<()> {
        self.module_entry_mut(role, module)?.is_hidden = true;

        info!("Module {} hidden for {} by {}", module, role, actor);
        self.record(ChangeLogEntry::new(ChangeType::ModuleHidden, Some(role), actor).with_module(module));
        Ok(())
    }

    /// Lift a module's hidden override
    pub fn show_module(&mut self, role: Role, module: Module, actor: &str) -> Result<()> {
        self.module_entry_mut(role, module)?.is_hidden = false;

        info!("Module {} shown for {} by {}", module, role, actor);
        self.record(ChangeLogEntry::new(ChangeType::ModuleShown, Some(role), actor).with_module(module));
        Ok(())
    }

    /// Grant every kind and unhide every module in the role's profile
    pub fn grant_all_permissions(&mut self, role: Role, actor: &str) -> Result<()> {
        let profile = self.profile_mut(role)?;
        for set in profile.modules.values_mut() {
            set.set_all(true);
            set.is_hidden = false;
        }

        info!("All permissions granted to {} by {}", role, actor);
        self.record(ChangeLogEntry::new(ChangeType::AllPermissionsGranted, Some(role), actor));
        Ok(())
    }

    /// Deny every kind on every module; hidden overrides are kept
    pub fn revoke_all_permissions(&mut self, role: Role, actor: &str) -> Result<()> {
        let profile = self.profile_mut(role)?;
        for set in profile.modules.values_mut() {
            set.set_all(false);
        }

        info!("All permissions revoked from {} by {}", role, actor);
        self.record(ChangeLogEntry::new(ChangeType::AllPermissionsRevoked, Some(role), actor));
        Ok(())
    }

    /// Restore the built-in default module map for a role
    pub fn reset_role_permissions(&mut self, role: Role, actor: &str) -> Result<()> {
        self.profile_mut(role)?.modules = default_module_map(role);

        info!("Permissions of {} reset to defaults by {}", role, actor);
        self.record(ChangeLogEntry::new(ChangeType::RolePermissionsReset, Some(role), actor));
        Ok(())
    }

    pub(crate) fn record(&mut self, entry: ChangeLogEntry) {
        self.log.append(entry);
        self.persist();
    }

    fn profile_mut(&mut self, role: Role) -> Result<&mut RolePermissionProfile> {
        self.profiles
            .get_mut(&role)
            .ok_or(PermissionError::RoleNotFound(role))
    }

    fn module_entry_mut(&mut self, role: Role, module: Module) -> Result<&mut ModulePermissionSet> {
        self.profile_mut(role)?
            .modules
            .get_mut(&module)
            .ok_or(PermissionError::ModuleNotFound { role, module })
    }
}
