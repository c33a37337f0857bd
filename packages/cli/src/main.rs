#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the damage map toolchain.
//!
//! * `render` loads a feature collection (from the server or a file),
//!   normalizes and renders it onto an in-memory map, prints the resulting
//!   render plan, and shows the processing countdown on a spinner.
//! * `normalize` prints the normalized collection only.
//! * `serve` starts the API server.
//!
//! Uses `indicatif-log-bridge` (via [`damage_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the status spinner never fight for the terminal.

mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use damage_map_server::ServerConfig;

#[derive(Parser)]
#[command(name = "damage_map", about = "Damage-assessment map toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and render a feature collection, then print the render plan
    Render(render::RenderArgs),
    /// Print the normalized feature collection
    Normalize(render::SourceArgs),
    /// Start the API server
    Serve(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Results file served at `/api/polygons`
    #[arg(long, default_value = damage_map_server::DEFAULT_POLYGONS_PATH)]
    polygons: PathBuf,
    /// Static frontend directory
    #[arg(long, default_value = damage_map_server::DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = damage_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render::run(&args, &multi).await?,
        Commands::Normalize(args) => render::normalize(&args, &multi).await?,
        Commands::Serve(args) => {
            let config = ServerConfig {
                bind_addr: args.bind,
                port: args.port,
                polygons_path: args.polygons,
                static_dir: args.static_dir,
            };
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(damage_map_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}
