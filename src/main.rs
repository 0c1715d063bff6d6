use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use velocoach::api::{self, AppState};
use velocoach::coach::{OpenAiClient, RacePlanGenerator};
use velocoach::config::Config;
use velocoach::db::{self, migrations::Migrator};

#[derive(Parser)]
#[command(name = "velocoach")]
#[command(about = "Race-plan coaching server for connected cyclists")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// SQLite database file (overrides VELOCOACH_DATABASE)
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Inspect or apply schema migrations
    Migrate {
        /// SQLite database file (overrides VELOCOACH_DATABASE)
        #[arg(long, global = true)]
        database: Option<PathBuf>,

        #[command(subcommand)]
        action: Option<MigrateAction>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply every pending migration (default)
    Up,
    /// List migrations and when they were applied
    Status,
    /// Revert the most recently applied migration
    Revert {
        /// Name of the migration to revert; must be the latest applied
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "velocoach=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            database,
        }) => {
            if let Some(path) = database {
                config.database_path = path;
            }
            serve(config, &host, port).await?;
        }
        Some(Commands::Migrate { database, action }) => {
            if let Some(path) = database {
                config.database_path = path;
            }
            migrate(&config, action.unwrap_or(MigrateAction::Up))?;
        }
        None => serve(config, "127.0.0.1", 3000).await?,
    }

    Ok(())
}

async fn serve(config: Config, host: &str, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting VeloCoach server on {}:{}", host, port);

    let db = db::Database::open(&config.database_path)?;
    let report = db.migrate()?;
    if !report.is_noop() {
        tracing::info!(applied = ?report.applied, "database migrated");
    }

    let client = OpenAiClient::new(config.oracle.clone())?;
    if !client.has_credential() {
        tracing::warn!("OPENAI_API_KEY is not set; race-plan requests will fail");
    }
    let generator = RacePlanGenerator::from_config(Arc::new(client), &config.oracle);

    let state = AppState::new(db, generator).with_error_details(config.expose_error_details);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    tracing::info!("VeloCoach server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn migrate(config: &Config, action: MigrateAction) -> anyhow::Result<()> {
    let db = db::Database::open(&config.database_path)?;
    let migrator = Migrator::default();

    match action {
        MigrateAction::Up => {
            let report = db.migrate_with(&migrator)?;
            for name in &report.applied {
                println!("applied  {name}");
            }
            for name in &report.skipped {
                println!("skipped  {name} (applied concurrently)");
            }
            if report.is_noop() {
                println!("database is up to date");
            }
        }
        MigrateAction::Status => {
            let states = db.with_connection(|conn| Ok(migrator.status(conn)?))?;
            for state in states {
                match state.applied_at {
                    Some(at) => println!("{:<40} {}", state.name, at.to_rfc3339()),
                    None => println!("{:<40} pending", state.name),
                }
            }
        }
        MigrateAction::Revert { name } => {
            db.with_connection(|conn| Ok(migrator.revert(conn, &name)?))?;
            println!("reverted {name}");
        }
    }

    Ok(())
}
