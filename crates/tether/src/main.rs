// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tether - links Telegram chats to OpenID Connect identities.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tether_config::{ConfigError, TetherConfig};

/// Tether - links Telegram chats to OpenID Connect identities.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot and the callback gateway.
    Serve,
    /// Validate configuration and exit.
    CheckConfig,
}

fn load(path: Option<&std::path::Path>) -> Result<TetherConfig, Vec<ConfigError>> {
    match path {
        Some(path) => tether_config::load_and_validate_path(path),
        None => tether_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            tether_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            eprintln!(
                "tether: config ok (gateway={}:{}{}, database={})",
                config.gateway.host,
                config.gateway.port,
                config.gateway.callback_path,
                config.storage.database_path
            );
        }
        None => {
            println!("tether: use --help for available commands");
        }
    }
}
