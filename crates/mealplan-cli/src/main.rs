mod config;
mod plan_cmds;
mod serve_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use mealplan_core::embedding::{Embedder, NegativeInnerProduct};
use mealplan_core::loader;
use mealplan_db::config::DbConfig;
use mealplan_db::pool;

use config::MealplanConfig;

#[derive(Parser)]
#[command(name = "mealplan", about = "Nutrition catalog and weekly meal-plan service")]
struct Cli {
    /// Database URL (overrides MEALPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create and migrate the mealplan database
    DbInit,
    /// Load catalog foods from a JSON file, skipping names already present
    LoadFoods {
        /// Path to the JSON food data file
        file: PathBuf,
        /// Generate a starter catalog at FILE first if it does not exist
        #[arg(long)]
        generate_missing: bool,
    },
    /// Write a generated starter catalog to a JSON food data file
    GenerateFoods {
        /// Path of the file to write
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Meal plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Serve the JSON HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate a weekly plan for a user
    Generate {
        /// User ID
        user_id: String,
        /// Any date of the target week, YYYY-MM-DD (defaults to the current week)
        #[arg(long)]
        week: Option<String>,
    },
    /// Show a plan with its days and foods
    Show {
        /// Plan ID to show
        plan_id: String,
    },
    /// List a user's plans, newest first
    List {
        /// User ID
        user_id: String,
    },
}

/// Execute the `mealplan init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        embedding: config::EmbeddingSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  embedding.dimension = {}", cfg.embedding.dimension);
    println!();
    println!("Next: run `mealplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `mealplan db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &MealplanConfig) -> anyhow::Result<()> {
    println!("Initializing mealplan database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = async {
        pool::run_migrations(&db_pool).await?;
        pool::table_counts(&db_pool).await
    }
    .await;
    db_pool.close().await;

    println!("Database ready. Tables:");
    for (table, count) in &result? {
        println!("  {table}: {count} rows");
    }
    println!("mealplan db-init complete.");
    Ok(())
}

/// Execute the `mealplan load-foods` command.
async fn cmd_load_foods(
    resolved: &MealplanConfig,
    file: &std::path::Path,
    generate_missing: bool,
) -> anyhow::Result<()> {
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let embedder = resolved.embedder();
    let result = if generate_missing {
        loader::load_or_generate_foods(&db_pool, &embedder, file).await
    } else {
        loader::load_foods_from_file(&db_pool, &embedder, file).await
    };
    db_pool.close().await;

    let summary = result?;
    println!(
        "Loaded {} food(s) from {} ({} already present).",
        summary.inserted,
        file.display(),
        summary.skipped
    );
    Ok(())
}

/// Execute the `mealplan generate-foods` command (no database required).
async fn cmd_generate_foods(file: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if file.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            file.display()
        );
    }
    let count = loader::write_generated_foods(file).await?;
    println!("Wrote {count} generated food(s) to {}.", file.display());
    println!("Next: run `mealplan load-foods {}`.", file.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            cmd_db_init(&resolved).await?;
        }
        Commands::LoadFoods {
            file,
            generate_missing,
        } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            cmd_load_foods(&resolved, &file, generate_missing).await?;
        }
        Commands::GenerateFoods { file, force } => {
            cmd_generate_foods(&file, force).await?;
        }
        Commands::Plan { command } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let embedder: Arc<dyn Embedder> = Arc::new(resolved.embedder());
            tracing::info!(embedder = embedder.name(), "using name embedder");
            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                embedder,
                ranker: Arc::new(NegativeInnerProduct),
            };
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
