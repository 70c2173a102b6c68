//! # CLI Commands
//!
//! `serve` runs the HTTP server. `init`, `list`, `show` and `delete` work on a
//! redb database file directly and must not run against a file a server
//! currently holds open. `analyze` submits a local image to a running server.

use crate::api::{AppState, create_router};
use crate::config::{ServeArgs, ServerConfig};
use clap::{Parser, Subcommand};
use lookmax_client::LookmaxClient;
use lookmax_core::{AnalysisId, AnalysisStore, DEFAULT_USER_ID, FaceAnalysisRecord, RedbStore, Storage};
use std::path::{Path, PathBuf};
use tracing::info;

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "lookmax", version, about = "LookMax face analysis server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Create an empty database file
    Init {
        #[arg(long, env = "LOOKMAX_DB", default_value = "lookmax.redb")]
        db: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// List stored analyses
    List {
        #[arg(long, env = "LOOKMAX_DB", default_value = "lookmax.redb")]
        db: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one analysis as JSON
    Show {
        #[arg(long, env = "LOOKMAX_DB", default_value = "lookmax.redb")]
        db: PathBuf,
        id: u64,
    },

    /// Delete one analysis
    Delete {
        #[arg(long, env = "LOOKMAX_DB", default_value = "lookmax.redb")]
        db: PathBuf,
        id: u64,
    },

    /// Submit an image to a running server
    Analyze {
        /// Image file path, or a `data:` URI
        image: String,
        #[arg(long, env = "LOOKMAX_SERVER", default_value = "http://127.0.0.1:5000")]
        server: String,
        #[arg(long, env = "LOOKMAX_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

/// Run a parsed command.
pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Serve(args) => cmd_serve(ServerConfig::try_from(args)?).await,
        Commands::Init { db, force } => cmd_init(&db, force),
        Commands::List { db, json } => cmd_list(&db, json),
        Commands::Show { db, id } => cmd_show(&db, AnalysisId(id)),
        Commands::Delete { db, id } => cmd_delete(&db, AnalysisId(id)),
        Commands::Analyze {
            image,
            server,
            api_key,
        } => cmd_analyze(&image, &server, api_key.as_deref()).await,
    }
}

// =============================================================================
// SERVE
// =============================================================================

pub async fn cmd_serve(config: ServerConfig) -> Result<(), String> {
    let storage = Storage::open(&config.backend, &config.db_path)
        .map_err(|e| format!("Failed to open storage: {}", e))?;
    info!(backend = storage.backend_name(), "storage ready");

    let mut state = AppState::new(storage);
    if let Some(key) = &config.api_key {
        state = state.with_api_key(key.as_str());
        info!("API key authentication enabled");
    }
    if let Some(rate) = config.rate_limit {
        state = state.with_rate_limit(rate);
        info!(per_second = rate.get(), "rate limiting enabled");
    }

    let app = create_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .map_err(|e| format!("Failed to bind {}:{}: {}", config.host, config.port, e))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {}", e))?;
    info!(%addr, "LookMax server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {}", e))?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// DATABASE COMMANDS
// =============================================================================

fn open_existing(db_path: &Path) -> Result<RedbStore, String> {
    if !db_path.exists() {
        return Err(format!(
            "Database {} does not exist (run `lookmax init` first)",
            db_path.display()
        ));
    }
    RedbStore::open(db_path).map_err(|e| format!("Failed to open database: {}", e))
}

pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), String> {
    if db_path.exists() {
        if !force {
            return Err(format!(
                "Database {} already exists (use --force to replace it)",
                db_path.display()
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| format!("Failed to remove {}: {}", db_path.display(), e))?;
    }
    RedbStore::open(db_path).map_err(|e| format!("Failed to create database: {}", e))?;
    println!("Initialized database at {}", db_path.display());
    Ok(())
}

/// All records of the current user, as `list` prints them.
pub fn load_analyses(db_path: &Path) -> Result<Vec<FaceAnalysisRecord>, String> {
    open_existing(db_path)?
        .list_by_user(DEFAULT_USER_ID)
        .map_err(|e| format!("Failed to list analyses: {}", e))
}

pub fn cmd_list(db_path: &Path, json: bool) -> Result<(), String> {
    let records = load_analyses(db_path)?;
    if json {
        let out = serde_json::to_string_pretty(&records).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }
    if records.is_empty() {
        println!("No analyses stored.");
        return Ok(());
    }
    println!("{:>6}  {:<26}  IMAGE", "ID", "CREATED");
    for record in &records {
        println!("{:>6}  {:<26}  {}", record.id, record.created_at, record.image_url);
    }
    println!("{} analysis record(s)", records.len());
    Ok(())
}

pub fn cmd_show(db_path: &Path, id: AnalysisId) -> Result<(), String> {
    let record = open_existing(db_path)?
        .get(id)
        .map_err(|e| format!("Failed to read analysis: {}", e))?
        .ok_or_else(|| format!("Analysis {} not found", id))?;
    let out = serde_json::to_string_pretty(&record).map_err(|e| e.to_string())?;
    println!("{}", out);
    Ok(())
}

pub fn cmd_delete(db_path: &Path, id: AnalysisId) -> Result<(), String> {
    let deleted = open_existing(db_path)?
        .delete(id)
        .map_err(|e| format!("Failed to delete analysis: {}", e))?;
    if !deleted {
        return Err(format!("Analysis {} not found", id));
    }
    println!("Deleted analysis {}", id);
    Ok(())
}

// =============================================================================
// ANALYZE
// =============================================================================

pub async fn cmd_analyze(image: &str, server: &str, api_key: Option<&str>) -> Result<(), String> {
    let client = match api_key {
        Some(key) => LookmaxClient::with_api_key(server, key).map_err(|e| e.to_string())?,
        None => LookmaxClient::new(server),
    };
    let submitted = if image.starts_with("data:") {
        client.analyze_data_uri(image).await
    } else {
        client.analyze_file(Path::new(image)).await
    };
    let record = submitted.map_err(|e| format!("Analysis failed: {}", e))?;

    println!("Analysis {} ({})", record.id, record.image_url);
    for feature in &record.analysis_data.features {
        println!("  {:<20} {}", feature.label, feature.value);
    }
    for rating in &record.analysis_data.ratings {
        println!("  {:<20} {:>3}", rating.category, rating.score);
    }
    Ok(())
}
