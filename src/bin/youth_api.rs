//! Youth Audit API Server
//!
//! REST API for multi-chain smart contract audits
//!
//! Usage:
//!   cargo run --bin youth_api
//!
//! Environment:
//!   GEMINI_API_KEY  - Language model key (audits and chat fail without it)
//!   YOUTH_DATA_FILE - Credential/quota store (default: ./youth_data.json)
//!   PORT/YOUTH_PORT - Server port (default: 8080)
//!   YOUTH_HOST      - Server host (default: 0.0.0.0)
//!   RUST_LOG        - Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use youth_audit::api::{create_router, start_cleanup_task, AppState};
use youth_audit::utils::constants::APP_VERSION;
use youth_audit::{AppConfig, Services};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = AppConfig::from_env();
    let services = Services::open(&config)?;
    info!("💾 State file: {}", config.data_file.display());

    let flow = services.scan_flow(&config)?;
    let state = Arc::new(AppState::new(
        flow,
        services.credentials.clone(),
        config.gemini_model.clone(),
    ));
    let state_for_shutdown = state.clone();

    // Start background cleanup task for rate limiter and chat sessions
    start_cleanup_task(state.clone());
    info!("🧹 Background cleanup task started");

    // Create router
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🚀 Youth Audit API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/audit                - Full scan (validate, quota, fetch, analyze)");
    info!("  POST /v1/chat                 - Follow-up security chat");
    info!("  GET  /v1/networks             - Supported networks");
    info!("  PUT  /v1/credentials/:chain   - Store explorer API key");
    info!("  GET  /v1/usage                - Daily scan usage");
    info!("  POST /v1/usage/upgrade        - Unlock unlimited scans");
    info!("  GET  /v1/health               - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");
    match services.usage.get_stats() {
        Ok(stats) => info!(
            "   Scans today: {} (pro: {})",
            stats.scans_used_today, stats.is_pro
        ),
        Err(e) => warn!("   ⚠️ Failed to read usage: {}", e),
    }
    info!("   Open chat sessions: {}", state_for_shutdown.chats.len());
    info!("👋 Youth Audit API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════╗
    ║                                                  ║
    ║   Y O U T H   ·   Contract Security Audits       ║
    ║   EVM + Solana · AI verdicts · v{:<16}║
    ║                                                  ║
    ╚══════════════════════════════════════════════════╝
    "#,
        APP_VERSION
    );
}
