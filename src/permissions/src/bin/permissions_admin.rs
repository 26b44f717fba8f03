//! # Permissions Admin CLI
//!
//! Inspect and edit a sled-backed permission store from the command line.
//! Every command prints JSON on stdout; diagnostics go to stderr.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `EMS_PERMISSIONS_DB` - database directory (default: ./permissions.db)
//! - `EMS_PERMISSIONS_ACTOR` - actor id recorded for changes (default: admin)
//! - `EMS_PERMISSIONS_KEY` / `EMS_PERMISSIONS_LOG_KEY` - backend key names
//! - `RUST_LOG` - log level (default: info)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ems_permissions::{
    ChangeLogFilter, ChangeType, Module, PermissionKind, PermissionStore, Role, SledBackend,
    StoreConfig,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Permissions Admin - manage the role x module permission matrix
#[derive(Parser)]
#[command(name = "permissions-admin")]
#[command(version = ems_permissions::VERSION)]
#[command(about = "Inspect and edit role permission profiles", long_about = None)]
struct Cli {
    /// Path to the permission database directory
    #[arg(long, env = "EMS_PERMISSIONS_DB", default_value = "permissions.db")]
    db: PathBuf,

    /// Actor id recorded in the change log
    #[arg(long, env = "EMS_PERMISSIONS_ACTOR", default_value = "admin")]
    actor: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a single permission
    Check {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        module: Module,
        #[arg(long)]
        kind: PermissionKind,
    },

    /// Check whether a role can see a module
    View {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        module: Module,
    },

    /// Print a role's permission summary
    Summary {
        #[arg(long)]
        role: Role,
    },

    /// List modules a role can see
    Visible {
        #[arg(long)]
        role: Role,
    },

    /// Set a single permission flag
    Set {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        module: Module,
        #[arg(long)]
        kind: PermissionKind,
        #[arg(long, action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Hide a module from a role
    Hide {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        module: Module,
    },

    /// Make a hidden module visible again
    Show {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        module: Module,
    },

    /// Grant every permission on every module
    GrantAll {
        #[arg(long)]
        role: Role,
    },

    /// Revoke every permission on every module
    RevokeAll {
        #[arg(long)]
        role: Role,
    },

    /// Restore a role's default permissions
    Reset {
        #[arg(long)]
        role: Role,
    },

    /// Query the change log
    Log {
        #[arg(long)]
        role: Option<Role>,
        #[arg(long = "type")]
        change_type: Option<ChangeType>,
        /// Inclusive lower bound (RFC 3339)
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Inclusive upper bound (RFC 3339)
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },

    /// Export the whole state as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Replace the whole state from an export file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn log_filter(
    role: Option<Role>,
    change_type: Option<ChangeType>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> ChangeLogFilter {
    ChangeLogFilter {
        user_role: role,
        change_type,
        start: since,
        end: until,
    }
}

/// Execute one command and return its JSON output
fn run(store: &mut PermissionStore, command: Commands, actor: &str) -> Result<Value> {
    match command {
        Commands::Check { role, module, kind } => {
            let allowed = store.engine().check_permission(role, module, kind);
            Ok(json!({ "role": role, "module": module, "kind": kind, "allowed": allowed }))
        }
        Commands::View { role, module } => {
            let visible = store.engine().can_view_module(role, module);
            Ok(json!({ "role": role, "module": module, "visible": visible }))
        }
        Commands::Summary { role } => match store.engine().summary(role) {
            Some(summary) => to_json(&summary),
            None => anyhow::bail!("no permission profile stored for role '{}'", role),
        },
        Commands::Visible { role } => to_json(&store.engine().visible_modules(role)),
        Commands::Set { role, module, kind, value } => {
            store.update_permission(role, module, kind, value, actor)?;
            to_json(&store.log().entries().last())
        }
        Commands::Hide { role, module } => {
            store.hide_module(role, module, actor)?;
            to_json(&store.log().entries().last())
        }
        Commands::Show { role, module } => {
            store.show_module(role, module, actor)?;
            to_json(&store.log().entries().last())
        }
        Commands::GrantAll { role } => {
            store.grant_all_permissions(role, actor)?;
            to_json(&store.log().entries().last())
        }
        Commands::RevokeAll { role } => {
            store.revoke_all_permissions(role, actor)?;
            to_json(&store.log().entries().last())
        }
        Commands::Reset { role } => {
            store.reset_role_permissions(role, actor)?;
            to_json(&store.log().entries().last())
        }
        Commands::Log { role, change_type, since, until } => {
            to_json(&store.change_log(&log_filter(role, change_type, since, until)))
        }
        Commands::Export { out } => {
            let bundle = store.export();
            match out {
                Some(path) => {
                    std::fs::write(&path, bundle.to_json()?)
                        .with_context(|| format!("failed to write export to {}", path.display()))?;
                    info!("Exported permissions to {}", path.display());
                    Ok(json!({ "exported": path.display().to_string() }))
                }
                None => to_json(&bundle),
            }
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            store.import_json(&text)?;
            Ok(json!({ "imported": store.profiles().len() }))
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let backend = SledBackend::open(&cli.db)
        .with_context(|| format!("failed to open permission database {}", cli.db.display()))?;
    let mut store = PermissionStore::open(Arc::new(backend), StoreConfig::from_env());

    let output = run(&mut store, cli.command, &cli.actor)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    let failures = store.stats().write_failures;
    if failures > 0 {
        warn!("{} backend writes failed during this run", failures);
    }

    store.teardown().context("failed to flush permission database")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ems_permissions::InMemoryBackend;

    fn store() -> PermissionStore {
        PermissionStore::open(Arc::new(InMemoryBackend::new()), StoreConfig::default())
    }

    fn command(args: &[&str]) -> Cli {
        let mut argv = vec!["permissions-admin"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_set_then_check() {
        let mut store = store();

        let cli = command(&[
            "--actor", "admin1", "set", "--role", "manager", "--module", "riders", "--kind", "delete",
            "--value", "true",
        ]);
        let entry = run(&mut store, cli.command, &cli.actor).unwrap();
        assert_eq!(entry["type"], "permission_update");
        assert_eq!(entry["changedBy"], "admin1");
        assert_eq!(entry["newValue"], true);

        let cli = command(&["check", "--role", "manager", "--module", "riders", "--kind", "delete"]);
        let output = run(&mut store, cli.command, &cli.actor).unwrap();
        assert_eq!(output["allowed"], true);
    }

    #[test]
    fn test_log_arguments_map_to_filter() {
        let mut store = store();
        for args in [
            ["hide", "--role", "manager", "--module", "orders"],
            ["hide", "--role", "supervisor", "--module", "orders"],
            ["show", "--role", "manager", "--module", "orders"],
        ] {
            let cli = command(&args);
            run(&mut store, cli.command, &cli.actor).unwrap();
        }

        let cli = command(&["log", "--role", "manager", "--type", "module_hidden"]);
        let output = run(&mut store, cli.command, &cli.actor).unwrap();
        let entries = output.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["userRole"], "manager");
        assert_eq!(entries[0]["changedBy"], "admin");

        let cli = command(&["log", "--until", "2000-01-01T00:00:00Z"]);
        let output = run(&mut store, cli.command, &cli.actor).unwrap();
        assert!(output.as_array().unwrap().is_empty());

        let since = Utc::now() - chrono::Duration::hours(1);
        let filter = log_filter(None, Some(ChangeType::ModuleShown), Some(since), None);
        assert_eq!(filter, ChangeLogFilter::new().of_type(ChangeType::ModuleShown).since(since));
    }

    #[test]
    fn test_rejects_unknown_identifiers() {
        let argv = ["permissions-admin", "check", "--role", "guest", "--module", "riders", "--kind", "view"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let path_arg = path.to_str().unwrap();

        let mut source = store();
        let cli = command(&["revoke-all", "--role", "supervisor"]);
        run(&mut source, cli.command, &cli.actor).unwrap();
        let cli = command(&["export", "--out", path_arg]);
        run(&mut source, cli.command, &cli.actor).unwrap();

        let mut target = store();
        let cli = command(&["import", path_arg]);
        let output = run(&mut target, cli.command, &cli.actor).unwrap();
        assert_eq!(output["imported"], 3);
        assert!(!target.engine().can_view_module(Role::Supervisor, Module::Dashboard));
    }
}
