use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use std::time::Duration;
use switchboard_server::{ServerConfig, SignalingMode, SignalingService, TurnCredentials, app};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(version, about = "WebRTC signaling server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(ServeArgs),
}

#[derive(clap::Args)]
struct ServeArgs {
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// `relay` forwards envelopes between peers, `sfu` negotiates with a media session.
    #[arg(long, env = "SIGNALING_MODE", default_value = "sfu")]
    mode: SignalingMode,

    /// Comma separated. Empty accepts any origin.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    #[arg(long, env = "TURN_KEY")]
    turn_key: Option<String>,

    #[arg(long, env = "TURN_API_TOKEN", hide_env_values = true)]
    turn_api_token: Option<String>,

    #[arg(
        long,
        env = "STUN_URLS",
        value_delimiter = ',',
        default_value = "stun:stun.l.google.com:19302"
    )]
    stun_urls: Vec<String>,

    #[arg(long, env = "ICE_TTL_SECS", default_value_t = 3600)]
    ice_ttl_secs: u64,

    #[arg(long, env = "OUTBOUND_QUEUE", default_value_t = 64)]
    outbound_queue: usize,

    /// Used when RUST_LOG is not set.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        let turn = match (self.turn_key, self.turn_api_token) {
            (Some(key_id), Some(api_token)) => Some(TurnCredentials { key_id, api_token }),
            (None, None) => None,
            _ => {
                warn!("TURN_KEY and TURN_API_TOKEN must be set together, falling back to STUN");
                None
            }
        };

        ServerConfig {
            bind_addr: self.addr,
            mode: self.mode,
            allowed_origins: non_empty(self.allowed_origins),
            turn,
            stun_urls: non_empty(self.stun_urls),
            ice_ttl: Duration::from_secs(self.ice_ttl_secs),
            outbound_queue_capacity: self.outbound_queue,
        }
    }
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { command } = Cli::parse();

    match command {
        Commands::Serve(args) => {
            init_tracing(&args.log_level);
            serve(args.into_config()).await?;
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(config: ServerConfig) -> Result<()> {
    println!("{}", "📡 Starting Switchboard...".green().bold());
    println!("   🔀 Mode:   {}", config.mode.to_string().cyan());
    println!("   🌐 Listen: {}", config.bind_addr.to_string().cyan());
    if config.turn.is_some() {
        println!("   🧊 ICE:    {}", "Cloudflare TURN".cyan());
    } else {
        println!("   🧊 ICE:    {}", config.stun_urls.join(", ").cyan());
    }

    let addr = config.bind_addr;
    let service = SignalingService::new(config);
    let router = app(service.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Signaling server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            service.shutdown();
        })
        .await
        .context("Server error")?;

    info!("Switchboard shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
