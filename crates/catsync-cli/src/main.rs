mod mutate;
mod query;
mod watch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::query::QueryArgs;

#[derive(Debug, Parser)]
#[command(name = "catsync-cli")]
#[command(about = "Catalog sync command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print a line for every catalog snapshot until ctrl-c
    Watch,
    /// Load the catalog once and print the filtered, sorted result
    Query(QueryArgs),
    /// Create a product from a JSON object
    Create {
        /// Product fields, e.g. '{"name":"Hat","price":25,"image":"hat.jpg"}'
        #[arg(long)]
        json: String,
    },
    /// Patch recognised fields of an existing product
    Update {
        /// Product id
        id: String,
        /// Fields to change as a JSON object
        #[arg(long)]
        json: String,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("catsync-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = catsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let store = catsync_store::open_store(&config)?;
    let collection = config.collection.as_str();

    match command {
        Commands::Watch => watch::run_watch(store, collection).await,
        Commands::Query(args) => query::run_query(store, collection, &args).await,
        Commands::Create { json } => mutate::run_create(store, collection, &json).await,
        Commands::Update { id, json } => mutate::run_update(store, collection, &id, &json).await,
        Commands::Delete { id } => mutate::run_delete(store, collection, &id).await,
    }
}
