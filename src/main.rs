use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use api_tester::config::config;
use api_tester::database::{DatabaseManager, MemoryStore, PgStore};
use api_tester::{auth, server, AppState};

#[derive(Parser)]
#[command(name = "api-tester")]
#[command(about = "Backend for saved HTTP requests, collections and run history")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP server")]
    Serve {
        #[arg(long, help = "Override the configured listen port")]
        port: Option<u16>,

        #[arg(long, help = "Keep all data in process memory instead of Postgres")]
        memory: bool,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,

    #[command(about = "Mint a bearer token for a user id")]
    Token {
        #[arg(long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let default_filter = config().default_log_filter();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve { port: None, memory: false }) {
        Commands::Serve { port, memory } => serve(port, memory).await,
        Commands::Migrate => migrate().await,
        Commands::Token { user } => {
            let token = auth::token_for_user(user).context("failed to mint token")?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting API tester in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let state = if memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        AppState::new(MemoryStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        if config.database.run_migrations {
            DatabaseManager::migrate(&pool).await?;
        }
        AppState::new(PgStore::new(pool))
    };

    server::serve(state, &config.server.host, port.unwrap_or(config.server.port)).await
}

async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config().database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await?;
    Ok(())
}
