//! Setlist — the server entry point.
//!
//! Reads configuration from the environment, applies command-line
//! overrides, and runs the HTTP gateway until interrupted.

use clap::Parser;
use setlist_config::AppConfig;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "setlist",
    about = "Setlist — AI playlist generator for Spotify",
    version,
    author
)]
struct Cli {
    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

fn announce_config(config: &AppConfig) {
    info!(
        model = %config.openai.model,
        max_turns = config.agent.max_turns,
        "Configuration loaded"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = AppConfig::from_env().map_err(|e| format!("Failed to load config: {e}"))?;
    cli.apply(&mut config);
    announce_config(&config);

    println!("🎵 Setlist");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   Model: {}", config.openai.model);

    setlist_gateway::start(config).await?;

    Ok(())
}
