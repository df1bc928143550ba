//! Operator CLI over the page service.
//!
//! # Responsibility
//! - Open the configured store and run one page use-case per invocation.
//! - Print results as JSON on stdout; errors go to stderr with a kind code.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use spiderweb_core::db::{is_healthy, open_db};
use spiderweb_core::{
    init_logging, CoreConfig, CreatePageRequest, PageProperty, PageService, PermissionType,
    SqlitePageRepository, SqliteReferenceRepository, StoreError, UpdatePageRequest,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "spiderweb", version, about = "Page store operator tool")]
struct Cli {
    /// SQLite database path (overrides SPIDERWEB_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage
    Ping,
    /// Report store health
    Health,
    /// Create a page owned by --user
    CreatePage {
        #[arg(long)]
        user: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        summary: String,
        /// Proposed page id; generated when omitted
        #[arg(long, default_value = "")]
        id: String,
        #[arg(long)]
        version: String,
        #[arg(long)]
        template: String,
        /// PR, PU, PO or LO
        #[arg(long, default_value = "PR", value_parser = parse_permission)]
        permission: PermissionType,
    },
    /// Show one page
    GetPage {
        #[arg(long)]
        user: String,
        id: String,
    },
    /// Change the supplied fields of a page owned by --user
    UpdatePage {
        #[arg(long)]
        user: String,
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        /// PR, PU, PO or LO
        #[arg(long, value_parser = parse_permission)]
        permission: Option<PermissionType>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        template: Option<String>,
    },
    /// List pages owned by --user
    ListPages {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "")]
        cursor: String,
    },
    /// Soft-delete a page
    RemovePage {
        #[arg(long)]
        user: String,
        id: String,
    },
    /// Show a page's properties
    GetProperties {
        #[arg(long)]
        user: String,
        id: String,
    },
    /// Replace a page's properties with a JSON array of {key, type, value}
    SetProperties {
        #[arg(long)]
        user: String,
        id: String,
        json: String,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        let kind = err
            .downcast_ref::<StoreError>()
            .map_or("error", |store_err| store_err.kind().as_str());
        eprintln!("error[{kind}]: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref().and_then(|dir| dir.to_str()) {
        init_logging(config.log_level, log_dir)
            .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;
    }

    if let Commands::Ping = cli.command {
        println!("spiderweb_core ping={}", spiderweb_core::ping());
        println!("spiderweb_core version={}", spiderweb_core::core_version());
        return Ok(());
    }

    let db_path = cli.db.unwrap_or(config.db_path);
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open `{}`", db_path.display()))?;
    info!("event=cli_command module=cli status=start");

    let service = PageService::new(
        SqlitePageRepository::try_new(&conn)?,
        SqliteReferenceRepository::try_new(&conn)?,
    );

    match cli.command {
        Commands::Ping => {}
        Commands::Health => print_json(&serde_json::json!({ "healthy": is_healthy(&conn)? }))?,
        Commands::CreatePage {
            user,
            title,
            summary,
            id,
            version,
            template,
            permission,
        } => {
            let request = CreatePageRequest {
                id,
                title,
                summary,
                permission: Some(permission),
                version_id: version,
                page_template_id: template,
            };
            print_json(&service.create_page(request, &user)?)?;
        }
        Commands::GetPage { user, id } => print_json(&service.get_page(&id, &user)?)?,
        Commands::UpdatePage {
            user,
            id,
            title,
            summary,
            permission,
            version,
            template,
        } => {
            let request = UpdatePageRequest {
                id: id.clone(),
                title,
                summary,
                permission,
                version_id: version,
                page_template_id: template,
            };
            service.update_page(request, &user)?;
            print_json(&service.get_page(&id, &user)?)?;
        }
        Commands::ListPages { user, cursor } => {
            print_json(&service.get_pages(&user, &cursor)?)?
        }
        Commands::RemovePage { user, id } => {
            service.remove_page(&id, &user)?;
            print_json(&serde_json::json!({ "removed": id }))?;
        }
        Commands::GetProperties { user, id } => {
            print_json(&service.get_page_properties(&id, &user)?)?
        }
        Commands::SetProperties { user, id, json } => {
            let properties: Vec<PageProperty> =
                serde_json::from_str(&json).context("properties must be a JSON array")?;
            service.replace_page_properties(&id, &user, &properties)?;
            print_json(&properties)?;
        }
    }

    Ok(())
}

fn parse_permission(value: &str) -> Result<PermissionType, String> {
    PermissionType::from_db(&value.to_ascii_uppercase())
        .ok_or_else(|| format!("unknown permission `{value}`; expected PR|PU|PO|LO"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_permission, Cli, Commands};
    use clap::Parser;
    use spiderweb_core::PermissionType;

    #[test]
    fn parses_create_page_arguments() {
        let cli = Cli::try_parse_from([
            "spiderweb",
            "--db",
            "/tmp/pages.db",
            "create-page",
            "--user",
            "UR_alice",
            "--title",
            "Hero",
            "--version",
            "VR_main",
            "--template",
            "PT_person",
            "--permission",
            "pu",
        ])
        .unwrap();

        match cli.command {
            Commands::CreatePage {
                permission, id, ..
            } => {
                assert_eq!(permission, PermissionType::Public);
                assert!(id.is_empty());
            }
            _ => panic!("expected create-page"),
        }
    }

    #[test]
    fn parses_update_page_with_only_supplied_fields() {
        let cli = Cli::try_parse_from([
            "spiderweb",
            "update-page",
            "--user",
            "UR_alice",
            "PG_00000000000A",
            "--title",
            "Renamed",
        ])
        .unwrap();

        match cli.command {
            Commands::UpdatePage {
                id,
                title,
                summary,
                permission,
                version,
                ..
            } => {
                assert_eq!(id, "PG_00000000000A");
                assert_eq!(title.as_deref(), Some("Renamed"));
                assert_eq!(summary, None);
                assert_eq!(permission, None);
                assert_eq!(version, None);
            }
            _ => panic!("expected update-page"),
        }
    }

    #[test]
    fn rejects_unknown_permission() {
        assert!(parse_permission("XX").is_err());
        assert_eq!(parse_permission("LO").unwrap(), PermissionType::LinkOnly);
    }
}
