//! Property tests for engine and mutation invariants

use ems_permissions::{
    ChangeLogFilter, ExportBundle, InMemoryBackend, Module, PermissionKind, PermissionStore, Role,
    StoreConfig, MAX_LOG_ENTRIES,
};
use proptest::prelude::*;
use std::sync::Arc;

fn memory_store() -> PermissionStore {
    PermissionStore::open(Arc::new(InMemoryBackend::new()), StoreConfig::default())
}

fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn module() -> impl Strategy<Value = Module> {
    prop::sample::select(Module::ALL.to_vec())
}

fn kind() -> impl Strategy<Value = PermissionKind> {
    prop::sample::select(PermissionKind::ALL.to_vec())
}

/// One mutation applied through the public API
#[derive(Debug, Clone)]
enum Op {
    Update(Role, Module, PermissionKind, bool),
    Hide(Role, Module),
    Show(Role, Module),
    GrantAll(Role),
    RevokeAll(Role),
    Reset(Role),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (role(), module(), kind(), any::<bool>()).prop_map(|(r, m, k, v)| Op::Update(r, m, k, v)),
        (role(), module()).prop_map(|(r, m)| Op::Hide(r, m)),
        (role(), module()).prop_map(|(r, m)| Op::Show(r, m)),
        role().prop_map(Op::GrantAll),
        role().prop_map(Op::RevokeAll),
        role().prop_map(Op::Reset),
    ]
}

fn apply(store: &mut PermissionStore, op: &Op) {
    let result = match *op {
        Op::Update(r, m, k, v) => store.update_permission(r, m, k, v, "prop"),
        Op::Hide(r, m) => store.hide_module(r, m, "prop"),
        Op::Show(r, m) => store.show_module(r, m, "prop"),
        Op::GrantAll(r) => store.grant_all_permissions(r, "prop"),
        Op::RevokeAll(r) => store.revoke_all_permissions(r, "prop"),
        Op::Reset(r) => store.reset_role_permissions(r, "prop"),
    };
    result.unwrap();
}

proptest! {
    #[test]
    fn test_admin_always_granted(ops in prop::collection::vec(op(), 0..40), m in module(), k in kind()) {
        let mut store = memory_store();
        for op in &ops {
            apply(&mut store, op);
        }

        prop_assert!(store.engine().check_permission(Role::Admin, m, k));
        prop_assert!(store.engine().can_view_module(Role::Admin, m));
    }

    #[test]
    fn test_each_mutation_appends_one_entry(ops in prop::collection::vec(op(), 0..40)) {
        let mut store = memory_store();
        for (i, op) in ops.iter().enumerate() {
            apply(&mut store, op);
            prop_assert_eq!(store.log().len(), i + 1);
        }
    }

    #[test]
    fn test_update_touches_exactly_one_flag(
        r in role(), m in module(), k in kind(), value in any::<bool>()
    ) {
        let mut store = memory_store();
        let before = store.profiles().clone();

        store.update_permission(r, m, k, value, "prop").unwrap();

        for role in Role::ALL {
            for module in Module::ALL {
                let old = &before[&role].modules[&module];
                let new = &store.profiles()[&role].modules[&module];
                prop_assert_eq!(old.is_hidden, new.is_hidden);
                for kind in PermissionKind::ALL {
                    if (role, module, kind) == (r, m, k) {
                        prop_assert_eq!(new.get(kind), value);
                    } else {
                        prop_assert_eq!(new.get(kind), old.get(kind));
                    }
                }
            }
        }
    }

    #[test]
    fn test_hide_then_show_restores_checks(r in role(), m in module()) {
        let mut store = memory_store();
        let before: Vec<bool> = PermissionKind::ALL
            .iter()
            .map(|k| store.engine().check_permission(r, m, *k))
            .collect();

        store.hide_module(r, m, "prop").unwrap();
        if !r.is_admin() {
            prop_assert!(!store.engine().has_any_permission(r, m, &PermissionKind::ALL));
        }

        store.show_module(r, m, "prop").unwrap();
        let after: Vec<bool> = PermissionKind::ALL
            .iter()
            .map(|k| store.engine().check_permission(r, m, *k))
            .collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn test_reset_restores_defaults(ops in prop::collection::vec(op(), 0..30), r in role()) {
        let mut store = memory_store();
        let seeded = store.profile(r).unwrap().modules.clone();
        for op in &ops {
            apply(&mut store, op);
        }

        store.reset_role_permissions(r, "prop").unwrap();
        prop_assert_eq!(&store.profile(r).unwrap().modules, &seeded);
    }

    #[test]
    fn test_export_import_round_trip(ops in prop::collection::vec(op(), 0..30)) {
        let mut source = memory_store();
        for op in &ops {
            apply(&mut source, op);
        }
        let bundle = source.export();
        let text = bundle.to_json().unwrap();
        let parsed: ExportBundle = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(&parsed, &bundle);

        let mut target = memory_store();
        target.import_json(&text).unwrap();
        prop_assert_eq!(target.profiles(), &bundle.permissions);
        for r in Role::ALL {
            for m in Module::ALL {
                for k in PermissionKind::ALL {
                    prop_assert_eq!(
                        target.engine().check_permission(r, m, k),
                        source.engine().check_permission(r, m, k)
                    );
                }
            }
        }
    }
}

#[test]
fn test_log_cap_under_sustained_writes() {
    let mut store = memory_store();
    for i in 0..(MAX_LOG_ENTRIES + 50) {
        let value = i % 2 == 0;
        store
            .update_permission(Role::Manager, Module::Orders, PermissionKind::Export, value, &format!("actor-{}", i))
            .unwrap();
    }

    assert_eq!(store.log().len(), MAX_LOG_ENTRIES);
    assert_eq!(store.log().entries()[0].changed_by, "actor-50");
    assert_eq!(
        store.change_log(&ChangeLogFilter::new().for_role(Role::Manager)).len(),
        MAX_LOG_ENTRIES
    );
}
