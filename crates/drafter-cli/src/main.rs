mod config;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use drafter_db::config::DbConfig;
use drafter_db::pool;

use config::DrafterConfig;

#[derive(Parser)]
#[command(name = "drafter", about = "Backend that drafts app plans from free-text ideas")]
struct Cli {
    /// Database URL (overrides DRAFTER_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a drafter config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Port the HTTP server listens on
        #[arg(long, default_value_t = config::DEFAULT_PORT)]
        port: u16,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the drafter database (requires config file or env vars)
    DbInit,
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        /// Port to listen on (overrides DRAFTER_PORT env var and config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Execute the `drafter init` command: write config file.
fn cmd_init(db_url: &str, port: u16, force: bool) -> Result<()> {
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
        server: config::ServerSection { port: Some(port) },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server.port = {port}");
    println!();
    println!("Next: run `drafter db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `drafter db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> Result<()> {
    let resolved = DrafterConfig::resolve(cli_db_url, None)?;

    println!("Initializing drafter database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database and run migrations.
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    // 3. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 4. Clean shutdown.
    db_pool.close().await;

    println!("drafter db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            port,
            force,
        } => {
            cmd_init(&db_url, port, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = DrafterConfig::resolve(cli.database_url.as_deref(), port)?;
            // The pool connects on first use, so the server comes up even
            // when the store is down; /test reports the store state.
            let db_pool = pool::create_lazy_pool(&resolved.db_config)?;
            let result = serve_cmd::run_serve(db_pool.clone(), &bind, resolved.port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}
