use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use spa_bridge::config::{self, AppConfig};
use spa_bridge::directory::{MemoryUserDirectory, PgUserDirectory, UserLookup};
use spa_bridge::protocol::HtmlShell;
use spa_bridge::session::MemorySessionStore;
use spa_bridge::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "spa-bridge", version, about = "Admin backend with a server-driven SPA bridge")]
struct Args {
    #[arg(long, help = "Address to bind (overrides SERVER_HOST)")]
    host: Option<String>,

    #[arg(long, short, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Serve the built-in demo users instead of DATABASE_URL")]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("spa_bridge=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config: AppConfig = config::config().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting spa-bridge in {:?} mode", config.environment);

    let users: Arc<dyn UserLookup> = match (&config.database.url, args.seed_demo) {
        (Some(url), false) => Arc::new(
            PgUserDirectory::connect(url, config.database.max_connections)
                .await
                .context("failed to connect user directory")?,
        ),
        _ => {
            tracing::warn!("No DATABASE_URL configured; serving demo users from memory");
            Arc::new(MemoryUserDirectory::demo().context("failed to seed demo users")?)
        }
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let sessions = MemorySessionStore::with_idle_timeout(config.session.idle_timeout());
    let state = AppState::new(
        config,
        users,
        Arc::new(sessions),
        Arc::new(HtmlShell::new()),
    )?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("spa-bridge listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
