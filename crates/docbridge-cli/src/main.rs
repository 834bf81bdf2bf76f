//! docbridge CLI - run one catalog operation against a MongoDB database
//!
//! Usage:
//!   docbridge -n shop insert-one users '{"name": "a"}'
//!   docbridge -n shop find users '{"age": {"$gte": 18}}'
//!   docbridge -n shop find-page users '{}' '{"name": 1}' 20 10
//!   docbridge -n shop update-many users '{"active": false}' '{"$set": {"archived": true}}'
//!   docbridge --config store.json distinct users city
//!
//! Arguments are MongoDB extended JSON. The outcome is printed as relaxed
//! extended JSON on stdout; diagnostics go to stderr.

use anyhow::{anyhow, Context, Result};
use bson::Bson;
use clap::{Parser, Subcommand};
use docbridge_mongodb::{MongoClient, MongoGateway, OperationOutcome, StoreConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "docbridge")]
#[command(about = "Run document store operations through the docbridge gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (name, address, retry_delay_ms, pool)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database name, appended to the address when connecting
    #[arg(short, long)]
    name: Option<String>,

    /// Server address, e.g. mongodb://localhost:27017/
    #[arg(short, long)]
    address: Option<String>,

    /// Delay between connection attempts in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Give up waiting for the connection after this many seconds
    #[arg(long, default_value = "30")]
    wait_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert one document (an array inserts its first element)
    InsertOne { collection: String, data: String },
    /// Insert an array of documents
    InsertMany { collection: String, documents: String },
    /// Distinct values of a field
    Distinct {
        collection: String,
        field: String,
        #[arg(default_value = "{}")]
        query: String,
    },
    /// Find the first matching document
    FindOne {
        collection: String,
        #[arg(default_value = "{}")]
        query: String,
    },
    /// Find every matching document
    Find {
        collection: String,
        #[arg(default_value = "{}")]
        query: String,
    },
    /// Find matching documents in sort order
    FindSorted {
        collection: String,
        query: String,
        sort: String,
    },
    /// Find one page of sorted documents
    FindPage {
        collection: String,
        query: String,
        sort: String,
        skip: i64,
        limit: i64,
    },
    /// Delete the first matching document
    DeleteOne { collection: String, query: String },
    /// Delete every matching document
    DeleteMany { collection: String, query: String },
    /// Update the first matching document
    UpdateOne {
        collection: String,
        query: String,
        update: String,
    },
    /// Update every matching document
    UpdateMany {
        collection: String,
        query: String,
        update: String,
    },
    /// Update the first matching document and print it as it was before
    FindAndUpdateOne {
        collection: String,
        query: String,
        update: String,
    },
}

/// Parse a MongoDB extended JSON argument
fn parse_json(input: &str) -> Result<Bson> {
    let value: serde_json::Value =
        serde_json::from_str(input).with_context(|| format!("Invalid JSON: {}", input))?;
    Bson::try_from(value).with_context(|| format!("Invalid extended JSON: {}", input))
}

/// File values first, then command-line overrides
fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StoreConfig::default(),
    };

    if let Some(name) = &cli.name {
        config.name = name.clone();
    }
    if let Some(address) = &cli.address {
        config.address = address.clone();
    }
    if let Some(delay) = cli.retry_delay_ms {
        config.retry_delay_ms = delay;
    }

    config.validate()?;
    Ok(config)
}

async fn run(gateway: &MongoGateway, command: Command) -> Result<OperationOutcome> {
    let outcome = match command {
        Command::InsertOne { collection, data } => {
            gateway.insert_one(&collection, parse_json(&data)?).await?
        }
        Command::InsertMany {
            collection,
            documents,
        } => {
            gateway
                .insert_many(&collection, parse_json(&documents)?)
                .await?
        }
        Command::Distinct {
            collection,
            field,
            query,
        } => {
            gateway
                .distinct(&collection, field, parse_json(&query)?)
                .await?
        }
        Command::FindOne { collection, query } => {
            gateway.find_one(&collection, parse_json(&query)?).await?
        }
        Command::Find { collection, query } => {
            gateway.find_many(&collection, parse_json(&query)?).await?
        }
        Command::FindSorted {
            collection,
            query,
            sort,
        } => {
            gateway
                .find_sorted(&collection, parse_json(&query)?, parse_json(&sort)?)
                .await?
        }
        Command::FindPage {
            collection,
            query,
            sort,
            skip,
            limit,
        } => {
            gateway
                .find_sorted_paged(
                    &collection,
                    parse_json(&query)?,
                    parse_json(&sort)?,
                    skip,
                    limit,
                )
                .await?
        }
        Command::DeleteOne { collection, query } => {
            gateway.delete_one(&collection, parse_json(&query)?).await?
        }
        Command::DeleteMany { collection, query } => {
            gateway.delete_many(&collection, parse_json(&query)?).await?
        }
        Command::UpdateOne {
            collection,
            query,
            update,
        } => {
            gateway
                .update_one(&collection, parse_json(&query)?, parse_json(&update)?)
                .await?
        }
        Command::UpdateMany {
            collection,
            query,
            update,
        } => {
            gateway
                .update_many(&collection, parse_json(&query)?, parse_json(&update)?)
                .await?
        }
        Command::FindAndUpdateOne {
            collection,
            query,
            update,
        } => {
            gateway
                .find_and_update_one(&collection, parse_json(&query)?, parse_json(&update)?)
                .await?
        }
    };

    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    let wait_timeout = Duration::from_secs(cli.wait_timeout_secs);

    let gateway = MongoGateway::new(MongoClient::with_pool(config.pool.clone()));
    gateway.open_with_config(&config);

    tokio::time::timeout(wait_timeout, gateway.wait_ready())
        .await
        .map_err(|_| {
            anyhow!(
                "Database '{}' not ready after {}s",
                config.name,
                wait_timeout.as_secs()
            )
        })?;
    info!(name = %config.name, "Connection ready");

    let result = run(&gateway, cli.command).await;
    gateway.close_connection().await;

    let output = result?.into_bson().into_relaxed_extjson();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
