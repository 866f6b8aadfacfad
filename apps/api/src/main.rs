mod config;
mod errors;
mod generation;
mod layout;
mod model_client;
mod nocodb;
mod output;
mod pipeline;
mod prompts;
mod render;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "imagegen", version, about = "Prompt-to-image API with a placeholder renderer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API and static frontend (default)
    Serve {
        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one image for a character and save it locally
    Generate {
        #[arg(long, default_value = "demo_character")]
        character: String,
        /// Overrides OUTPUT_DIR
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::Generate { character, out_dir } => {
            info!("Generating image for '{character}'");
            pipeline::run_from_config(&config, &character, out_dir).await
        }
    }
}

async fn serve(config: Config, port: Option<u16>) -> Result<()> {
    info!("Starting imagegen API v{}", env!("CARGO_PKG_VERSION"));

    let port = port.unwrap_or(config.port);
    let state = AppState::from_config(config);
    info!(
        "Prompts file: {}, static dir: {}",
        state.prompts.local_path().display(),
        state.config.static_dir.display()
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
