//! `seeder`: configure the store, then add, import, list and delete auction
//! items in the collection the querygate server reads. Store settings come from the same layering as the
//! server (`.env`, `querygate.*`, `QUERYGATE__STORE__*`).

mod commands;

use clap::{Parser, Subcommand};
use server::ServerConfig;
use std::path::PathBuf;
use store::build_store;

#[derive(Parser)]
#[command(name = "seeder", about = "Seed and inspect the querygate collection")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a single auction item.
    Add {
        title: String,
        description: String,
        start_price: i64,
        reserve_price: i64,
    },
    /// Bulk import items from a JSON array file.
    ImportFile {
        /// File to load seed data from
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print every item in the collection.
    #[command(alias = "getAll")]
    GetAll,
    /// Delete items whose field equals a value.
    Delete {
        /// The field name to match
        field: String,
        /// The value to match; numbers and booleans match as such
        value: String,
        /// Delete every match instead of only the first
        #[arg(short, long)]
        multi: bool,
    },
    /// Save store connection settings to a settings file.
    Setup {
        /// MongoDB connection string
        #[arg(long)]
        connection_string: String,
        /// Database name (defaults to the current setting)
        #[arg(long)]
        database: Option<String>,
        /// Collection name (defaults to the current setting)
        #[arg(long)]
        collection: Option<String>,
        /// Settings file to update
        #[arg(short, long, default_value = "querygate.toml")]
        file: PathBuf,
    },
    /// Show the resolved store settings (password redacted).
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    let _ = dotenvy::dotenv();
    let mut config = ServerConfig::load()?.store;

    let command = match cli.command {
        Command::Settings => {
            for line in commands::settings(&config) {
                println!("{line}");
            }
            return Ok(());
        }
        Command::Setup {
            connection_string,
            database,
            collection,
            file,
        } => {
            config.connection_string = Some(connection_string);
            config.database = database.unwrap_or(config.database);
            config.collection = collection.unwrap_or(config.collection);
            commands::setup(&config, &file).await?;
            println!("Settings saved to {}", file.display());
            for line in commands::settings(&config) {
                println!("{line}");
            }
            return Ok(());
        }
        other => other,
    };

    let store = build_store(&config).await?;
    let outcome = run(command, store.as_ref()).await;
    store.shutdown().await;
    outcome
}

async fn run(command: Command, store: &dyn store::DocumentStore) -> anyhow::Result<()> {
    match command {
        Command::Add {
            title,
            description,
            start_price,
            reserve_price,
        } => {
            let item = commands::Item {
                title,
                description,
                start_price,
                reserve_price,
            };
            let id = commands::add(store, &item).await?;
            println!("Data added ({id})");
        }
        Command::ImportFile { file } => {
            let written = commands::import_file(store, &file).await?;
            println!("Imported {written} items");
        }
        Command::GetAll => {
            for item in commands::get_all(store).await? {
                println!("{item}");
            }
        }
        Command::Delete {
            field,
            value,
            multi,
        } => {
            let deleted = commands::delete(store, &field, &value, multi).await?;
            match (multi, deleted) {
                (true, n) => println!("Deleted {n} items matching {field} = {value}"),
                (false, 0) => println!("No matching item found to delete"),
                (false, _) => println!("Deleted item with {field} = {value}"),
            }
        }
        Command::Settings | Command::Setup { .. } => {}
    }
    Ok(())
}
