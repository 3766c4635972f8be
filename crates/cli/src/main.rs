//! RocketShoes CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Print the stored cart
//! shoes-cli show
//!
//! # Add one unit of product 3
//! shoes-cli add 3
//!
//! # Set product 3 to four units
//! shoes-cli update 3 4
//!
//! # Remove product 3
//! shoes-cli remove 3
//! ```
//!
//! # Commands
//!
//! - `show` - Print the cart as JSON
//! - `add` - Add one unit of a product
//! - `remove` - Remove a product's line
//! - `update` - Set a product's quantity

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "shoes-cli")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    /// Directory holding the cart storage file (overrides `ROCKETSHOES_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Catalog API base URL (overrides `ROCKETSHOES_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<Url>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        id: ProductId,

        /// New quantity (zero or negative is ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing on stderr so stdout only carries command output.
///
/// Defaults to info level for our crates if `RUST_LOG` is not set.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rocketshoes_cli=info".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let mut config = rocketshoes_cart::CartConfig::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }

    match cli.command {
        Commands::Show => commands::cart::show(&config).await,
        Commands::Add { id } => commands::cart::add(&config, id).await,
        Commands::Remove { id } => commands::cart::remove(&config, id).await,
        Commands::Update { id, amount } => commands::cart::update(&config, id, amount).await,
    }
}
