use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shipway::auth::session;
use shipway::config::{ServerConfig, token_ttl_from_secs};
use shipway::mail::{LogTransport, Mailer};
use shipway::server::{AppState, create_router};
use shipway::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "shipway")]
#[command(about = "Deployment request tracking server", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database
    Init {
        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Manage user tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Issue a fresh token for a user, replacing any previous one
    Issue {
        #[arg(long)]
        user_id: i64,

        /// Token lifetime in seconds (defaults to the configured TTL)
        #[arg(long)]
        ttl_secs: Option<i64>,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Revoke every token held by a user
    Revoke {
        #[arg(long)]
        user_id: i64,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    Ok(config)
}

/// Opens the database of an initialized data directory.
fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!("Server not initialized. Run 'shipway init' first to create the database.");
    }
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    Ok(store)
}

fn run_init(config: &ServerConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.data_dir)?;
    let db_path = config.db_path();
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    println!("Initialized database at {}", db_path.display());
    Ok(())
}

fn run_token(config_path: Option<&PathBuf>, command: TokenCommands) -> anyhow::Result<()> {
    match command {
        TokenCommands::Issue {
            user_id,
            ttl_secs,
            data_dir,
        } => {
            let config = load_config(config_path, data_dir)?;
            let ttl = match ttl_secs {
                Some(secs) if secs <= 0 => bail!("--ttl-secs must be positive"),
                Some(secs) => token_ttl_from_secs(secs)?,
                None => config.token_ttl()?,
            };
            let store = open_store(&config)?;
            let issued = session::issue(&store, user_id, ttl)?;

            println!("Token for user {user_id} (save this, it won't be shown again):");
            println!();
            println!("  {}", issued.token);
            println!();
            println!("Expires at {}", issued.expire_time.to_rfc3339());
        }
        TokenCommands::Revoke { user_id, data_dir } => {
            let config = load_config(config_path, data_dir)?;
            let store = open_store(&config)?;
            session::delete_by_user_id(&store, user_id)?;
            println!("Revoked tokens for user {user_id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("shipway=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::Init { data_dir } => {
            let config = load_config(config_path, data_dir)?;
            run_init(&config)?;
        }
        Commands::Token { command } => run_token(config_path, command)?,
        Commands::Serve {
            host,
            port,
            data_dir,
        } => {
            let mut config = load_config(config_path, data_dir)?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let store = open_store(&config)?;
            let mailer = config
                .mail
                .clone()
                .map(|mail| Arc::new(Mailer::new(mail, Arc::new(LogTransport))));
            if mailer.is_none() {
                info!("No [mail] section configured, audit notices disabled");
            }

            let addr = config.socket_addr()?;
            let state = Arc::new(AppState {
                store: Arc::new(store),
                config,
                mailer,
            });
            let app = create_router(state);

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
