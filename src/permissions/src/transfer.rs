//! Whole-state export and import

use crate::audit::{ChangeLog, ChangeLogEntry, ChangeType};
use crate::error::{PermissionError, Result};
use crate::store::PermissionStore;
use crate::types::ProfileMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Actor recorded for imports
pub const IMPORT_ACTOR: &str = "system";

/// Self-describing snapshot of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub permissions: ProfileMap,
    #[serde(default)]
    pub log: Vec<ChangeLogEntry>,
}

impl ExportBundle {
    /// Pretty-printed JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl PermissionStore {
    /// Snapshot every profile and the change log
    pub fn export(&self) -> ExportBundle {
        ExportBundle {
            version: self.config().export_version.clone(),
            export_date: Utc::now(),
            permissions: self.profiles.clone(),
            log: self.log.entries().to_vec(),
        }
    }

    /// Replace stored state with an exported snapshot
    ///
    /// `permissions` replaces the profile map verbatim: profiles are not
    /// merged and are not checked for catalog completeness, so a module
    /// missing from an imported profile simply reads as denied. A present
    /// `log` array replaces the change log. Either field being malformed
    /// rejects the whole payload before anything changes.
    pub fn import(&mut self, blob: &Value) -> Result<()> {
        let fields = blob
            .as_object()
            .ok_or_else(|| PermissionError::ImportValidation("payload is not an object".to_string()))?;

        let permissions = fields
            .get("permissions")
            .filter(|value| !value.is_null())
            .ok_or_else(|| PermissionError::ImportValidation("missing 'permissions' field".to_string()))?;

        let profiles: ProfileMap = serde_json::from_value(permissions.clone()).map_err(|e| {
            PermissionError::ImportValidation(format!("malformed 'permissions' field: {}", e))
        })?;

        let entries = match fields.get("log") {
            None | Some(Value::Null) => None,
            Some(log) => Some(
                serde_json::from_value::<Vec<ChangeLogEntry>>(log.clone()).map_err(|e| {
                    PermissionError::ImportValidation(format!("malformed 'log' field: {}", e))
                })?,
            ),
        };

        info!(
            "Importing {} permission profiles{}",
            profiles.len(),
            entries
                .as_ref()
                .map(|entries| format!(" and {} change log entries", entries.len()))
                .unwrap_or_default()
        );

        self.profiles = profiles;
        if let Some(entries) = entries {
            self.log = ChangeLog::from_entries(entries);
        }

        self.record(ChangeLogEntry::new(ChangeType::PermissionsImported, None, IMPORT_ACTOR));
        Ok(())
    }

    /// Parse JSON text and [`import`](Self::import) it
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let blob: Value = serde_json::from_str(text)
            .map_err(|e| PermissionError::ImportValidation(format!("payload is not valid JSON: {}", e)))?;
        self.import(&blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::store::{StoreConfig, DEFAULT_EXPORT_VERSION};
    use crate::types::{Module, PermissionKind, Role};
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> PermissionStore {
        PermissionStore::open(Arc::new(InMemoryBackend::new()), StoreConfig::default())
    }

    #[test]
    fn test_export_shape() {
        let mut store = store();
        store.hide_module(Role::Supervisor, Module::Orders, "admin1").unwrap();

        let bundle = store.export();
        assert_eq!(bundle.version, DEFAULT_EXPORT_VERSION);
        assert_eq!(bundle.permissions.len(), 3);
        assert_eq!(bundle.log.len(), 1);

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["exportDate"].is_string());
        assert_eq!(json["permissions"]["supervisor"]["modules"]["orders"]["isHidden"], true);
        assert_eq!(json["log"][0]["type"], "module_hidden");
    }

    #[test]
    fn test_missing_permissions_rejected() {
        let mut store = store();
        let before = store.profiles().clone();

        for payload in [json!({}), json!({"permissions": null}), json!([1, 2]), json!({"log": []})] {
            let err = store.import(&payload).unwrap_err();
            assert!(matches!(err, PermissionError::ImportValidation(_)), "payload {}", payload);
        }
        assert_eq!(store.profiles(), &before);
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_malformed_fields_rejected() {
        let mut store = store();

        let bad_role = json!({"permissions": {"guest": {}}});
        assert!(matches!(store.import(&bad_role), Err(PermissionError::ImportValidation(_))));

        let bad_log = json!({"permissions": {}, "log": [{"type": "nope"}]});
        assert!(matches!(store.import(&bad_log), Err(PermissionError::ImportValidation(_))));

        assert!(matches!(store.import_json("{oops"), Err(PermissionError::ImportValidation(_))));
        assert_eq!(store.profiles().len(), 3);
    }

    #[test]
    fn test_import_replaces_verbatim() {
        let mut store = store();
        let payload = json!({
            "permissions": {
                "manager": {
                    "role": "manager",
                    "modules": {"riders": {"view": true, "delete": true}},
                    "isActive": true,
                    "createdAt": "2024-01-01T00:00:00Z"
                }
            }
        });

        store.import(&payload).unwrap();

        assert_eq!(store.profiles().len(), 1);
        let engine = store.engine();
        assert!(engine.check_permission(Role::Manager, Module::Riders, PermissionKind::Delete));
        assert!(!engine.check_permission(Role::Manager, Module::Dashboard, PermissionKind::View));
        assert!(engine.summary(Role::Supervisor).is_none());

        let last = store.log().entries().last().unwrap();
        assert_eq!(last.change_type, ChangeType::PermissionsImported);
        assert_eq!(last.user_role, None);
        assert_eq!(last.changed_by, IMPORT_ACTOR);
    }

    #[test]
    fn test_round_trip_through_json_text() {
        let mut source = store();
        source
            .update_permission(Role::Manager, Module::Orders, PermissionKind::Delete, true, "admin1")
            .unwrap();
        source.hide_module(Role::Supervisor, Module::Reports, "admin1").unwrap();

        let bundle = source.export();
        let text = bundle.to_json().unwrap();

        let mut target = store();
        target.import_json(&text).unwrap();

        assert_eq!(target.profiles(), &bundle.permissions);
        let entries = target.log().entries();
        assert_eq!(&entries[..bundle.log.len()], bundle.log.as_slice());
        assert_eq!(entries.len(), bundle.log.len() + 1);
    }
}
