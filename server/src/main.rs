//! fsgate: sandboxed filesystem browser server

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod storage;

use config::Config;
use storage::RootStore;

#[derive(Parser)]
#[command(name = "fsgate")]
#[command(about = "Browse, search and manage one directory over HTTP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server in the foreground
    Serve,
    /// Print the listing of a folder below the root as JSON
    Browse {
        /// Folder relative to the root (defaults to the root)
        #[arg(default_value = "")]
        path: String,
    },
    /// Search every file and folder name below the root
    Search {
        /// Case-insensitive substring
        term: String,
    },
    /// Create a folder below the root
    Mkdir {
        /// Parent folder relative to the root
        #[arg(long, default_value = "")]
        path: String,
        /// Folder name; may contain `/` to create nested folders
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fsgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve => {
            run_server(config).await?;
        }
        Commands::Browse { path } => {
            let store = RootStore::from_config(&config)?;
            let listing = store.list(&path)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Commands::Search { term } => {
            let store = RootStore::from_config(&config)?;
            let hits = store.search(&term)?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        Commands::Mkdir { path, name } => {
            let store = RootStore::from_config(&config)?;
            let created = store.mkdir(&path, &name)?;
            println!("created {}", created);
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let store = RootStore::from_config(&config)?;
    tracing::info!(
        root = %store.sandbox().root().display(),
        case_sensitive = store.sandbox().is_case_sensitive(),
        max_upload_bytes = store.policy().max_bytes,
        "sandbox ready"
    );

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.rest_port).parse()?;
    let state = api::AppState::new(store, config);

    api::rest::serve(addr, state).await?;

    tracing::info!("server stopped");
    Ok(())
}
