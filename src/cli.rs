//! Command-line front end.
//!
//! Applications that compile their own migrations call [`run`] from their
//! `main` with a [`Registry`](crate::Registry) of those migrations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mongodb::Database;

use crate::config::MigrateConfig;
use crate::migrations::{Migrator, ScriptLoader};

#[derive(Debug, Parser)]
#[command(name = "mongo-migrate")]
#[command(about = "Apply, roll back and inspect MongoDB migration scripts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// MongoDB connection string
    #[arg(long, global = true, env = "MONGO_MIGRATE_URL")]
    pub url: Option<String>,

    /// Database name (defaults to the one in the connection string)
    #[arg(long, global = true, env = "MONGO_MIGRATE_DB")]
    pub db: Option<String>,

    /// Absolute path of the scripts directory
    #[arg(long, global = true, env = "MONGO_MIGRATE_SCRIPTS_DIR")]
    pub scripts_dir: Option<PathBuf>,

    /// Collection holding the migration log
    #[arg(long, global = true, env = "MONGO_MIGRATE_COLLECTION")]
    pub collection: Option<String>,

    /// Template used by `create`
    #[arg(long, global = true, env = "MONGO_MIGRATE_TEMPLATE")]
    pub template: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply every pending script
    Up,
    /// Roll back the most recently applied script
    Down,
    /// Show the migration log
    Status,
    /// List scripts that have not been applied
    Pending,
    /// Scaffold a new script file
    Create {
        /// Label appended after the timestamp
        label: String,
    },
}

impl Cli {
    /// Environment settings with command-line flags layered on top.
    pub fn config(&self) -> crate::Result<MigrateConfig> {
        dotenvy::dotenv().ok();

        let mut config = match &self.scripts_dir {
            Some(dir) => MigrateConfig::from_env_with_scripts_dir(dir),
            None => MigrateConfig::from_env()?,
        };
        if let Some(url) = &self.url {
            config.store_url = url.clone();
        }
        if let Some(db) = &self.db {
            config.database_name = Some(db.clone());
        }
        if let Some(collection) = &self.collection {
            config.collection_name = collection.clone();
        }
        if let Some(template) = &self.template {
            config.template_path = Some(template.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Parses process arguments and runs one command against MongoDB.
pub async fn run<L>(loader: L) -> anyhow::Result<()>
where
    L: ScriptLoader<Database>,
{
    let cli = Cli::parse();
    let config = cli.config()?;
    let migrator = Migrator::mongo(config, loader)?;
    let outcome = execute(&migrator, &cli.command).await;
    migrator.close().await?;
    outcome
}

async fn execute<L>(
    migrator: &Migrator<crate::store::MongoLogStore, L>,
    command: &Command,
) -> anyhow::Result<()>
where
    L: ScriptLoader<Database>,
{
    match command {
        Command::Up => {
            let applied = migrator.up().await?;
            if applied.is_empty() {
                println!("Nothing to apply");
            }
            for name in applied {
                println!("Applied {name}");
            }
        }
        Command::Down => match migrator.down().await? {
            Some(name) => println!("Rolled back {name}"),
            None => println!("Nothing to roll back"),
        },
        Command::Status => {
            let entries = migrator.status().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Pending => {
            for script in migrator.pending().await? {
                println!("{}", script.name());
            }
        }
        Command::Create { label } => {
            let filename = migrator.create(label).await?;
            println!("Created {filename}");
        }
    }
    Ok(())
}
