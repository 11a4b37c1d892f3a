//! Commerce CLI - Database migrations, seeding and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run marketplace database migrations
//! commerce-cli migrate
//!
//! # Load users, stores and products from a YAML catalog
//! commerce-cli seed data/catalog.yaml
//!
//! # Browse the catalog
//! commerce-cli stores list
//! commerce-cli products list --sort price.desc --sellers acme.bolt --page 2
//! commerce-cli products show widget
//!
//! # Edit a product
//! commerce-cli products update 3 --store-id 1 --name "Blue Widget" --price 12.50
//! ```
//!
//! # Environment Variables
//!
//! See `commerce_market::config`. `RUST_LOG` overrides the default log
//! filter and `LOG_FORMAT=json` switches to JSON logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_LOG_FILTER: &str = "commerce_market=info,commerce_cli=info";

#[derive(Parser)]
#[command(name = "commerce-cli")]
#[command(author, version, about = "Commerce marketplace CLI tools")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database from a YAML catalog
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Inspect stores
    Stores {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Inspect and edit products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// List all stores
    List,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List one page of the catalog
    List(commands::products::ListArgs),
    /// Show a product and its store
    Show {
        /// Product slug
        slug: String,
    },
    /// Overwrite a product's editable fields
    Update(commands::products::UpdateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json_flag: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = json_flag
        || std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::Stores { action } => match action {
            StoreAction::List => commands::stores::list().await?,
        },
        Commands::Products { action } => match action {
            ProductAction::List(args) => commands::products::list(args).await?,
            ProductAction::Show { slug } => commands::products::show(&slug).await?,
            ProductAction::Update(args) => commands::products::update(args).await?,
        },
    }
    Ok(())
}
