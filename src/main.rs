mod catalog;
mod config;
mod database;
mod entities;
mod http_server;
mod import;
mod logging;
mod pagination;
mod ports;
mod query;
mod repositories;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    catalog::CatalogSession,
    config::Config,
    database::Database,
    import::{CatalogFile, CatalogImporter},
    logging::{init_tracing, shutdown_tracing},
    repositories::AlbumRepository,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MUSIC_CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, overrides the config file (e.g. "debug" or "music_catalog=trace")
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn is_file(s: &str) -> Result<PathBuf, String> {
    let p: PathBuf = s.into();
    if p.is_file() {
        Ok(p)
    } else {
        Err(format!("`{}` is not an existing file", s))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the catalog website
    Serve {
        /// The port to run the server on, overrides the config file
        #[arg(short, long, env = "MUSIC_CATALOG_HTTP_PORT")]
        port: Option<u16>,
    },
    /// Import labels, styles, artists, albums and tracks from a TOML file
    Import {
        /// The catalog file to import
        #[arg(short, long, value_parser = is_file)]
        input: PathBuf,
    },
    /// Delete an album and its tracks
    RemoveAlbum {
        /// Id of the album to delete
        #[arg(long)]
        id: i64,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load music-catalog config")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let tracer_provider = init_tracing(
        "music-catalog",
        config.logging.otlp_endpoint.as_deref(),
        &level,
    )?;

    let result = run(args.command, &mut config).await;
    shutdown_tracing(tracer_provider);
    result
}

async fn run(command: Commands, config: &mut Config) -> Result<()> {
    match command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                tracing::info!("Default config at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let database = Database::open(&config.database_path()).await?;
            http_server::app::start(config, database).await?;
        }
        Commands::Import { input } => {
            tracing::debug!("Starting import of {}", input.display());
            let file = CatalogFile::from_file(&input)?;
            let database = Arc::new(Database::open(&config.database_path()).await?);
            let summary = CatalogImporter::new(database).import(file).await?;
            println!(
                "Imported {} new and {} updated records, {} style links",
                summary.inserted, summary.updated, summary.links
            );
        }
        Commands::RemoveAlbum { id } => {
            let database = Arc::new(Database::open(&config.database_path()).await?);
            let albums = AlbumRepository::new(database);
            let mut session = CatalogSession::new();

            let Some(album) = albums.load(&mut session, id).await? else {
                println!("No album with id {id}");
                return Ok(());
            };
            let summary = albums
                .remove_with_tracks(&mut session, album, true)
                .await
                .wrap_err_with(|| format!("Failed to remove album {id}"))?;
            if let Some(summary) = summary {
                println!("Deleted {} records", summary.deleted);
            }
        }
    }

    Ok(())
}
