//! Todo service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use todo_service::api::{create_router, AppState};
use todo_service::config::{Config, StorageBackend};
use todo_service::metrics;
use todo_service::repository::PgTodoRepository;
use todo_service::utils::{build_repository, shutdown_signal};

/// Todo CRUD service.
#[derive(Parser, Debug)]
#[command(name = "todo-service")]
#[command(about = "HTTP CRUD service for todo records, backed by PostgreSQL or memory")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage backend (overrides STORAGE_BACKEND).
    #[arg(long)]
    backend: Option<StorageBackend>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage backend (overrides STORAGE_BACKEND).
        #[arg(long)]
        backend: Option<StorageBackend>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Check the database connection and report the record count.
    CheckDatabase,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration first so it can drive logging
    let loaded = Config::load();
    let log_config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(
        &log_config.log_directives(args.verbose),
        log_config.json_logs(),
    );

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(loaded).await,
        Some(Command::CheckDatabase) => cmd_check_database(loaded).await,
        Some(Command::Serve { port, backend }) => cmd_serve(loaded, port, backend).await,
        None => cmd_serve(loaded, args.port, args.backend).await,
    }
}

fn init_logging(directives: &str, json: bool) {
    let (filter, rejected) = match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    if let Some(e) = rejected {
        warn!("Ignoring log filter {:?}, using info: {}", directives, e);
    }
}

/// Check configuration validity.
async fn cmd_check_config(loaded: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TODO SERVICE - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match loaded {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Storage Backend: {}", config.storage_backend);
    match config.redacted_database_url() {
        Some(url) => println!("  Database URL: {}", url),
        None if config.storage_backend == StorageBackend::Postgres => {
            println!("  WARNING: postgres backend requires DATABASE_URL to be set!")
        }
        None => println!("  Database URL: (not set)"),
    }
    println!("  Max Connections: {}", config.database_max_connections);
    println!("  Port: {}", config.port);
    println!("  Log Level: {}", config.rust_log);
    println!("  Log Format: {}", config.log_format);
    println!("  Verbose: {}", config.verbose);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Check the database connection and report the record count.
async fn cmd_check_database(loaded: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TODO SERVICE - DATABASE CHECK");
    println!("======================================================================");

    let config = loaded?;
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

    if let Some(redacted) = config.redacted_database_url() {
        println!("Database: {}", redacted);
    }

    // Connect
    print!("\n1. Connecting... ");
    let repository = match PgTodoRepository::connect(url, config.database_max_connections).await {
        Ok(r) => {
            println!("OK");
            r
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
            return Err(anyhow::anyhow!("Database connection failed"));
        }
    };

    // Count records
    print!("\n2. Counting todos... ");
    match repository.count().await {
        Ok(count) => {
            println!("OK");
            println!("   Todos stored: {}", count);
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
            return Err(anyhow::anyhow!("Failed to query the todos table"));
        }
    }

    println!("\n======================================================================");
    println!("DATABASE CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Serve the HTTP API until a shutdown signal arrives.
async fn cmd_serve(
    loaded: Result<Config, envy::Error>,
    port: Option<u16>,
    backend: Option<StorageBackend>,
) -> anyhow::Result<()> {
    let mut config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(backend) = backend {
        config.storage_backend = backend;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Storage backend: {}", config.storage_backend);

    // Connect storage
    let repository = build_repository(&config).await.map_err(|e| {
        error!("Failed to initialize storage: {}", e);
        e
    })?;

    // Create app state
    let mut app_state = AppState::new(repository);
    match metrics::install_recorder() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Metrics disabled: {}", e),
    }

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting server on http://{}", addr);

    let router = create_router(app_state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
