//! Presentation-facing helpers built on [`PermissionEngine`]
//!
//! These answer the questions UI code actually asks ("can this button be
//! shown?", "which sections go in the nav bar?") without re-deriving the
//! engine's rules.

use crate::engine::PermissionEngine;
use crate::types::{Module, PermissionKind, Role};
use serde::{Deserialize, Serialize};

/// Navigable screen section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Overview,
    Supervisors,
    Riders,
    Inventory,
    Orders,
    Deductions,
}

impl Section {
    /// Every section, in navigation order
    pub const ALL: [Section; 6] = [
        Section::Overview,
        Section::Supervisors,
        Section::Riders,
        Section::Inventory,
        Section::Orders,
        Section::Deductions,
    ];

    /// Module that governs access to the section
    pub fn module(self) -> Module {
        match self {
            Section::Overview => Module::Dashboard,
            Section::Supervisors => Module::Supervisors,
            Section::Riders => Module::Riders,
            Section::Inventory => Module::Inventory,
            Section::Orders => Module::Orders,
            Section::Deductions => Module::Deductions,
        }
    }
}

/// Kind of record an action list is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Supervisor,
    Rider,
    Inventory,
    Order,
    Deduction,
}

impl ItemType {
    pub fn module(self) -> Module {
        match self {
            ItemType::Supervisor => Module::Supervisors,
            ItemType::Rider => Module::Riders,
            ItemType::Inventory => Module::Inventory,
            ItemType::Order => Module::Orders,
            ItemType::Deduction => Module::Deductions,
        }
    }

    /// Actions the UI offers for this item type
    pub fn actions(self) -> &'static [&'static str] {
        match self {
            ItemType::Supervisor => &["view", "add", "edit", "delete"],
            ItemType::Rider => &["view", "add", "edit", "delete", "upload_photo"],
            ItemType::Inventory => &["view", "edit", "export"],
            ItemType::Order => &["view", "add", "approve", "reject"],
            ItemType::Deduction => &["view", "add", "delete"],
        }
    }
}

/// Navigation entry, optionally gated on a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub label: String,
    #[serde(default)]
    pub requires_module: Option<Module>,
}

impl MenuItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            requires_module: None,
        }
    }

    pub fn requiring(mut self, module: Module) -> Self {
        self.requires_module = Some(module);
        self
    }
}

impl PermissionEngine<'_> {
    /// Check a UI action by name; names that are not a permission kind are denied
    pub fn can_show_action(&self, role: Role, module: Module, action: &str) -> bool {
        action
            .parse::<PermissionKind>()
            .map(|kind| self.check_permission(role, module, kind))
            .unwrap_or(false)
    }

    pub fn can_access_section(&self, role: Role, section: Section) -> bool {
        self.can_view_module(role, section.module())
    }

    /// Sections `role` can open, in navigation order
    pub fn available_sections(&self, role: Role) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| self.can_access_section(role, *section))
            .collect()
    }

    /// Keep ungated items and items whose module `role` can view
    pub fn filter_menu_items<'m>(&self, role: Role, items: &'m [MenuItem]) -> Vec<&'m MenuItem> {
        items
            .iter()
            .filter(|item| match item.requires_module {
                Some(module) => self.can_view_module(role, module),
                None => true,
            })
            .collect()
    }

    /// Actions of `item_type` that `role` may perform
    ///
    /// Every item type is decided the same way against its own module:
    /// `view` follows module visibility, other actions need the matching
    /// permission kind, and actions with no matching kind are never offered.
    pub fn available_actions(&self, role: Role, item_type: ItemType) -> Vec<&'static str> {
        let module = item_type.module();
        item_type
            .actions()
            .iter()
            .copied()
            .filter(|action| match *action {
                "view" => self.can_view_module(role, module),
                other => self.can_show_action(role, module, other),
            })
            .collect()
    }
}
