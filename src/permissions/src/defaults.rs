//! Built-in default permission matrix
//!
//! Used to seed profiles on first initialization and to restore a single
//! role on reset. Admin gets every kind on every module; manager and
//! supervisor get the fixed baselines below.

use crate::types::{Module, ModuleMap, ModulePermissionSet, Role, RolePermissionProfile};

/// (module, [view, add, edit, delete, export])
type MatrixRow = (Module, [bool; 5]);

const MANAGER_MATRIX: [MatrixRow; 9] = [
    (Module::Dashboard, [true, true, false, false, false]),
    (Module::Supervisors, [true, true, true, false, false]),
    (Module::Riders, [true, true, true, false, true]),
    (Module::Inventory, [true, true, true, false, true]),
    (Module::Orders, [true, true, true, false, true]),
    (Module::Reports, [true, false, false, false, true]),
    (Module::Deductions, [true, true, true, false, true]),
    (Module::Settings, [false, false, false, false, false]),
    (Module::PermissionsAdmin, [false, false, false, false, false]),
];

const SUPERVISOR_MATRIX: [MatrixRow; 9] = [
    (Module::Dashboard, [true, false, false, false, false]),
    (Module::Supervisors, [false, false, false, false, false]),
    (Module::Riders, [true, false, false, false, false]),
    (Module::Inventory, [true, false, false, false, false]),
    (Module::Orders, [true, true, false, false, false]),
    (Module::Reports, [true, false, false, false, false]),
    (Module::Deductions, [false, false, false, false, false]),
    (Module::Settings, [false, false, false, false, false]),
    (Module::PermissionsAdmin, [false, false, false, false, false]),
];

fn from_matrix(rows: &[MatrixRow]) -> ModuleMap {
    rows.iter()
        .map(|(module, [view, add, edit, delete, export])| {
            (*module, ModulePermissionSet::new(*view, *add, *edit, *delete, *export))
        })
        .collect()
}

/// Every catalog module with every kind granted
pub fn full_module_map() -> ModuleMap {
    Module::ALL
        .into_iter()
        .map(|module| (module, ModulePermissionSet::full()))
        .collect()
}

/// Default module map for a role
pub fn default_module_map(role: Role) -> ModuleMap {
    match role {
        Role::Admin => full_module_map(),
        Role::Manager => from_matrix(&MANAGER_MATRIX),
        Role::Supervisor => from_matrix(&SUPERVISOR_MATRIX),
    }
}

/// Fresh default profile for a role
pub fn default_profile(role: Role) -> RolePermissionProfile {
    RolePermissionProfile::new(role, default_module_map(role))
}
