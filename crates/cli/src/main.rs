//! Eglys CLI - Database migrations and order inspection.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! eglys-cli migrate
//!
//! # List a customer's orders, newest first
//! eglys-cli orders 42
//!
//! # Show one order with its lines
//! eglys-cli orders 42 --order 7
//! ```
//!
//! Both commands read `EGLYS_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "eglys-cli")]
#[command(author, version, about = "Eglys storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect a customer's orders
    Orders {
        /// Customer (user) ID
        user_id: i32,

        /// Show this order with its lines instead of the list
        #[arg(short, long)]
        order: Option<i32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await,
        Commands::Orders {
            user_id,
            order,
            json,
        } => commands::orders::show(user_id, order, json).await,
    }
}
