use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::config::AppConfig;
use crate::database::connection::DbConnection;
use crate::models::user::validate_user_password;

pub(crate) mod auth;
pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod database;
pub(crate) mod error;
pub(crate) mod models;
pub(crate) mod server;
pub(crate) mod storage;

#[cfg(test)]
mod tests;

/// University resource catalog server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Drop and recreate the schema, seeding the origin admin, before serving.
    #[arg(long, requires = "origin_password")]
    init_schema: bool,
    /// Password of the seeded origin admin.
    #[arg(long)]
    origin_password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = AppConfig::from_yaml_file(&args.config)?;
    if args.init_schema {
        let password = args.origin_password.as_deref().unwrap_or_default();
        validate_user_password(password).context("invalid origin password")?;
        let db = DbConnection::connect(&config.database).await?;
        db.drop_all().await?;
        db.create_all(password).await?;
        info!("schema initialised");
    }
    server::run_all(&config).await?;

    Ok(())
}
