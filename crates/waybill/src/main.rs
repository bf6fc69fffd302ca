// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waybill - operator CLI for the logistics site database.
//!
//! This is the binary entry point. Every subcommand loads configuration,
//! opens the store on demand, and reports errors on stderr with a non-zero
//! exit status.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod backup;
mod commands;
mod doctor;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use waybill_config::model::WaybillConfig;
use waybill_core::{NewShipment, StorageAdapter, WaybillError};
use waybill_storage::SqliteStore;

/// Waybill - operator CLI for the logistics site database.
#[derive(Parser, Debug)]
#[command(name = "waybill", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database (if needed) and the configured admin account.
    Init,
    /// Check configuration, database health, and integrity.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Copy the database to a file (or into a directory) while it is live.
    Backup {
        /// Destination file or directory. Defaults to a timestamped file here.
        path: Option<PathBuf>,
    },
    /// Replace the database with a backup. Stop the site first.
    Restore {
        /// Backup file to restore from.
        path: PathBuf,
    },
    /// Look up a shipment by tracking number.
    Track {
        tracking_number: String,
        /// Print the shipment as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Read and change site settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage shipments.
    Shipments {
        #[command(subcommand)]
        action: ShipmentsAction,
    },
    /// Manage service offerings.
    Services {
        #[command(subcommand)]
        action: ServicesAction,
    },
    /// Read contact and quote submissions.
    Messages {
        #[command(subcommand)]
        action: MessagesAction,
    },
    /// Manage back-office accounts.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print every setting.
    List,
    /// Insert or replace one setting.
    Set { key: String, value: String },
}

#[derive(Subcommand, Debug)]
enum ShipmentsAction {
    /// Newest shipments first.
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Register a new shipment.
    Add {
        tracking_number: String,
        #[arg(long, default_value = "")]
        sender: String,
        #[arg(long, default_value = "")]
        receiver: String,
        #[arg(long, default_value = "")]
        origin: String,
        #[arg(long, default_value = "")]
        destination: String,
        /// Current location. Defaults to the origin.
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value = "Pending")]
        status: String,
        /// Estimated delivery date.
        #[arg(long, default_value = "")]
        eta: String,
    },
    /// Record a shipment's progress.
    Update {
        tracking_number: String,
        #[arg(long)]
        location: String,
        #[arg(long)]
        status: String,
        /// New estimated delivery date. Unchanged when omitted.
        #[arg(long)]
        eta: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ServicesAction {
    List,
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Image path or URL.
        #[arg(long)]
        image: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum MessagesAction {
    /// Newest submissions first.
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,
        /// Only show quote requests.
        #[arg(long)]
        quotes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// Create an admin account. The password comes from
    /// WAYBILL_ADMIN_PASSWORD or an interactive prompt.
    Create { username: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            waybill_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.site.log_level);

    match run(cli.command, &config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<WaybillConfig, Vec<waybill_config::ConfigError>> {
    match path {
        Some(path) => waybill_config::load_and_validate_path(path),
        None => waybill_config::load_and_validate(),
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waybill={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatch a subcommand. Returns the process exit code.
async fn run(command: Commands, config: &WaybillConfig) -> Result<i32, WaybillError> {
    let db_path = PathBuf::from(&config.storage.database_path);

    // Commands that work on the file directly, without an open store.
    match &command {
        Commands::Doctor { plain } => {
            let failures = doctor::run_doctor(config, *plain).await?;
            return Ok(if failures > 0 { 1 } else { 0 });
        }
        Commands::Backup { path } => {
            let dest = path
                .clone()
                .unwrap_or_else(|| backup::default_backup_name(chrono::Local::now()));
            backup::run_backup(&db_path, &dest)?;
            return Ok(0);
        }
        Commands::Restore { path } => {
            backup::run_restore(&db_path, path)?;
            return Ok(0);
        }
        _ => {}
    }

    let store = SqliteStore::new(config.storage.clone());
    let mut stdout = std::io::stdout().lock();
    let out: &mut dyn Write = &mut stdout;

    let code = match command {
        Commands::Init => {
            commands::init(&store, config, out).await?;
            0
        }
        Commands::Track {
            tracking_number,
            json,
        } => {
            if commands::track(&store, &tracking_number, json, out).await? {
                0
            } else {
                2
            }
        }
        Commands::Settings { action } => {
            match action {
                SettingsAction::List => commands::settings_list(&store, out).await?,
                SettingsAction::Set { key, value } => {
                    commands::settings_set(&store, &key, &value, out).await?
                }
            }
            0
        }
        Commands::Shipments { action } => {
            match action {
                ShipmentsAction::List { limit } => {
                    commands::shipments_list(&store, limit, out).await?
                }
                ShipmentsAction::Add {
                    tracking_number,
                    sender,
                    receiver,
                    origin,
                    destination,
                    location,
                    status,
                    eta,
                } => {
                    let shipment = NewShipment {
                        current_location: location.unwrap_or_else(|| origin.clone()),
                        tracking_number,
                        sender_name: sender,
                        receiver_name: receiver,
                        origin,
                        destination,
                        status,
                        estimated_delivery: eta,
                    };
                    commands::shipments_add(&store, &shipment, out).await?
                }
                ShipmentsAction::Update {
                    tracking_number,
                    location,
                    status,
                    eta,
                } => {
                    commands::shipments_update(
                        &store,
                        &tracking_number,
                        &location,
                        &status,
                        eta.as_deref(),
                        out,
                    )
                    .await?
                }
            }
            0
        }
        Commands::Services { action } => {
            match action {
                ServicesAction::List => commands::services_list(&store, out).await?,
                ServicesAction::Add {
                    title,
                    description,
                    image,
                } => {
                    commands::services_add(&store, &title, &description, image.as_deref(), out)
                        .await?
                }
                ServicesAction::Delete { id } => commands::services_delete(&store, id, out).await?,
            }
            0
        }
        Commands::Messages { action } => {
            match action {
                MessagesAction::List { limit, quotes } => {
                    commands::messages_list(&store, limit, quotes, out).await?
                }
            }
            0
        }
        Commands::Admin { action } => {
            match action {
                AdminAction::Create { username } => {
                    let password = waybill_auth::prompt::new_password(&username)?;
                    commands::admin_create(&store, config, &username, &password, out).await?
                }
            }
            0
        }
        Commands::Doctor { .. } | Commands::Backup { .. } | Commands::Restore { .. } => 0,
    };

    store.close().await?;
    Ok(code)
}
