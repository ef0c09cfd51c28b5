use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod commands;

use commands::{init_database, migrate_and_serve, serve};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "blogsite")]
#[command(about = "Blogsite web server and database tools")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Database URL
        ///
        /// For SQLite databases, use:
        ///   - sqlite:///absolute/path/to/database.sqlite?mode=rwc
        #[arg(short, long, env = "DATABASE_URL")]
        database_url: Option<String>,

        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS")]
        bind_address: Option<String>,
    },
    /// Initialize the database using migrations
    InitDb {
        /// Database URL
        ///
        /// The parent directory will be created automatically if it doesn't exist.
        #[arg(short, long, env = "DATABASE_URL")]
        database_url: Option<String>,
    },
    /// Apply pending migrations, then start the web server
    MigrateAndServe {
        /// Database URL
        #[arg(short, long, env = "DATABASE_URL")]
        database_url: Option<String>,

        /// Bind address for the web server
        #[arg(short, long, env = "BIND_ADDRESS")]
        bind_address: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut settings = Settings::load()?;
        match self.command {
            Commands::Serve { database_url, bind_address } => {
                apply_overrides(&mut settings, database_url, bind_address);
                serve(&settings).await?;
            }
            Commands::InitDb { database_url } => {
                apply_overrides(&mut settings, database_url, None);
                init_database(&settings.database_url).await?;
            }
            Commands::MigrateAndServe { database_url, bind_address } => {
                apply_overrides(&mut settings, database_url, bind_address);
                migrate_and_serve(&settings).await?;
            }
        }
        Ok(())
    }
}

fn apply_overrides(settings: &mut Settings, database_url: Option<String>, bind_address: Option<String>) {
    if let Some(database_url) = database_url {
        settings.database_url = database_url;
    }
    if let Some(bind_address) = bind_address {
        settings.bind_address = bind_address;
    }
}
