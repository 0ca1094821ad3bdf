//! Youth Audit CLI
//!
//! Multi-chain smart contract security scanner:
//! - Fetches verified source from the chain's block explorer
//! - Runs a structured AI audit and prints the verdict
//! - Tracks the free daily quota and per-chain explorer keys

use clap::{Parser, Subcommand};
use eyre::{eyre, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use youth_audit::core::auditor::CHAT_GREETING;
use youth_audit::{AppConfig, AppError, ChainId, ScanOutcome, Services};

#[derive(Parser)]
#[command(name = "youth_audit")]
#[command(about = "Multi-chain smart contract security auditor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a verified contract
    Scan {
        /// Contract or program address
        address: String,

        /// Chain id, short name or name (e.g. 1, ETH, base, solana)
        #[arg(short, long, default_value = "1")]
        chain: String,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store the explorer API key for a chain
    SetKey {
        /// Chain id, short name or name
        chain: String,

        /// Explorer API key
        key: String,
    },

    /// Show today's scan usage
    Usage,

    /// Unlock unlimited scans
    Upgrade,

    /// List supported networks
    Networks,

    /// Ask the security assistant follow-up questions
    Chat {
        /// Context line for the assistant (e.g. the contract you are looking at)
        #[arg(long)]
        context: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env();
    let services = Services::open(&config)?;

    match cli.command {
        Commands::Scan {
            address,
            chain,
            json,
        } => cmd_scan(&services, &config, &address, &chain, json).await,
        Commands::SetKey { chain, key } => cmd_set_key(&services, &chain, &key),
        Commands::Usage => cmd_usage(&services),
        Commands::Upgrade => cmd_upgrade(&services),
        Commands::Networks => {
            cmd_networks(&services);
            Ok(())
        }
        Commands::Chat { context } => cmd_chat(&services, &config, context).await,
    }
}

fn parse_chain(raw: &str) -> Result<ChainId> {
    raw.parse::<ChainId>().map_err(|e| eyre!(e.message))
}

async fn cmd_scan(
    services: &Services,
    config: &AppConfig,
    address: &str,
    chain: &str,
    json: bool,
) -> Result<()> {
    let chain = parse_chain(chain)?;
    let flow = services.scan_flow(config)?;

    println!("🛡️  Scanning {} on {}...", address, chain.name());
    let report = flow.run(address, chain).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match &report.outcome {
        ScanOutcome::Completed { contract, audit } => {
            if !json {
                println!("{}", audit.summary(contract));
            }
            if let Some(left) = services.usage.remaining_scans()? {
                println!("   {} free scan(s) left today", left);
            }
            Ok(())
        }
        ScanOutcome::UpgradeRequired { stats } => {
            println!(
                "🔒 Daily limit reached ({} of {} scans used). Run `youth_audit upgrade` for unlimited scans.",
                stats.scans_used_today,
                services.usage.daily_limit()
            );
            Ok(())
        }
        ScanOutcome::InvalidAddress { message } => Err(AppError::invalid_address(message.clone()).into()),
        ScanOutcome::Failed {
            kind,
            message,
            prompt_credentials,
            retryable,
        } => {
            eprintln!("❌ {}", message);
            if *retryable {
                eprintln!("   This is usually temporary. Run the same scan again in a moment.");
            }
            if *prompt_credentials {
                eprintln!(
                    "   Set it with: youth_audit set-key {} <KEY>  (or {})",
                    chain.descriptor().short_name,
                    chain.descriptor().credential_env_var()
                );
            }
            Err(eyre!("scan failed: {}", kind))
        }
    }
}

fn cmd_set_key(services: &Services, chain: &str, key: &str) -> Result<()> {
    let chain = parse_chain(chain)?;
    services.credentials.set(chain, key.trim())?;
    println!("🔑 {} API key saved", chain.name());
    Ok(())
}

fn cmd_usage(services: &Services) -> Result<()> {
    let stats = services.usage.get_stats()?;
    if stats.is_pro {
        println!("⭐ Pro: unlimited scans ({} today)", stats.scans_used_today);
    } else {
        println!(
            "📊 {} / {} scans used today ({} UTC)",
            stats.scans_used_today,
            services.usage.daily_limit(),
            stats.last_reset_date
        );
    }
    Ok(())
}

fn cmd_upgrade(services: &Services) -> Result<()> {
    let stats = services.usage.upgrade_to_pro()?;
    println!("⭐ Pro unlocked. Unlimited scans (used today: {})", stats.scans_used_today);
    Ok(())
}

fn cmd_networks(services: &Services) {
    println!("{:<14} {:<10} {:<6} {:<7} KEY", "NAME", "ID", "SHORT", "FAMILY");
    for chain in ChainId::ALL {
        let d = chain.descriptor();
        println!(
            "{:<14} {:<10} {:<6} {:<7} {}",
            d.name,
            chain.id(),
            d.short_name,
            d.family.as_str(),
            if services.credentials.is_configured(chain) { "✅" } else { "-" }
        );
    }
}

async fn cmd_chat(services: &Services, config: &AppConfig, context: Option<String>) -> Result<()> {
    let flow = services.scan_flow(config)?;
    let mut chat = match context.as_deref() {
        Some(ctx) => flow.auditor().create_chat(Some(ctx)),
        None => flow.auditor().create_audit_chat(None),
    };

    println!("💬 {}", CHAT_GREETING);
    println!("   (empty line or Ctrl+D to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            break;
        }
        if let Some(reply) = chat.send(&line).await {
            println!("\n{}\n", reply);
        }
    }

    Ok(())
}
