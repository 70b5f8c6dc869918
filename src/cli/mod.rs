//! Command-line interface.
//!
//! With no subcommand (or `serve`) the binary starts the HTTP server; the
//! remaining subcommands are one-shot administrative tasks:
//! - `create-superuser` - Create an account with staff and superuser rights
//! - `config check` - Validate the configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::validation::{validate_email, validate_password};
use crate::config::Config;
use crate::db::{self, User};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "recipe-api")]
#[command(author, version, about = "A REST API for recipes, tags and ingredients", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "RECIPE_API_CONFIG", default_value = "recipe-api.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Create a superuser account
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RECIPE_API_SUPERUSER_PASSWORD")]
        password: String,
        #[arg(long, default_value = "")]
        name: String,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

impl Cli {
    /// Whether this invocation should start the server
    pub fn is_serve(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

/// Run a one-shot CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::CreateSuperuser {
            email,
            password,
            name,
        }) => {
            let config = Config::load(&cli.config)?;
            cmd_create_superuser(&config, email, password, name).await
        }
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        Some(Commands::Serve) | None => {
            // Starting the server is handled in main.rs
            Ok(())
        }
    }
}

async fn cmd_create_superuser(
    config: &Config,
    email: &str,
    password: &str,
    name: &str,
) -> Result<()> {
    validate_email(email).map_err(anyhow::Error::msg)?;
    validate_password(password, config.auth.min_password_length).map_err(anyhow::Error::msg)?;

    let pool = db::open(&config.server).await?;
    let user = User::create_superuser(&pool, email, password, name)
        .await
        .context("Failed to create superuser")?;
    pool.close().await;

    println!("[OK] Superuser created: {}", user.email);
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("A default configuration will be used when starting the server.");
        return Ok(());
    }

    let config = Config::load(config_path)?;

    println!("[OK] Configuration file is valid!");
    println!();
    println!("Server:");
    println!("  Listen:       {}", config.server.bind_addr());
    match config.server.database_url {
        Some(ref url) => println!("  Database:     {}", url),
        None => println!(
            "  Database:     {}",
            config.server.data_dir.join("recipes.db").display()
        ),
    }
    println!();
    println!("Auth:");
    println!("  Token TTL:    {} days", config.auth.session_ttl_days);
    println!("  Min password: {} characters", config.auth.min_password_length);
    println!();
    println!("Logging:");
    println!("  Level:        {}", config.logging.level);

    Ok(())
}
