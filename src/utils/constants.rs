//! Constants Module - Single Source of Truth
//!
//! Chain table, explorer endpoints, quota and truncation limits, storage keys.
//! No other module hardcodes these values.

use crate::models::config::{ChainDescriptor, ChainFamily, ChainId};

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "Youth";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("YouthAudit/", env!("CARGO_PKG_VERSION"));

// ============================================
// LIMITS
// ============================================

/// Timeout applied to every explorer request (milliseconds)
pub const EXPLORER_TIMEOUT_MS: u64 = 10_000;

/// Free-tier scans per calendar day
pub const DAILY_SCAN_LIMIT: u32 = 5;

/// Source prefix sent to the model (characters)
pub const MAX_SOURCE_CHARS: usize = 30_000;

/// Timeout for model calls (seconds). Structured audits of large sources are slow.
pub const LLM_TIMEOUT_SECS: u64 = 120;

/// Open chat sessions kept by the API server; the least recently used goes first
pub const MAX_CHAT_SESSIONS: usize = 256;

/// Chat sessions idle longer than this are dropped by the cleanup task
pub const CHAT_IDLE_TIMEOUT_SECS: u64 = 30 * 60;

// ============================================
// STORAGE KEYS
// ============================================

/// Prefix for per-chain explorer credentials
pub const CREDENTIAL_KEY_PREFIX: &str = "youth_api_key_";

/// Key holding the serialized usage record
pub const USAGE_STATS_KEY: &str = "sc_usage_stats";

// ============================================
// LLM DEFAULTS
// ============================================

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================
// CHAIN TABLE - display order
// ============================================

/// All supported chains, in display order.
/// `ChainId::index` points into this table.
pub static NETWORKS: [ChainDescriptor; 8] = [
    ChainDescriptor {
        id: ChainId::Ethereum,
        name: "Ethereum",
        short_name: "ETH",
        api_url: "https://api.etherscan.io/v2/api",
        explorer_url: "https://etherscan.io",
        family: ChainFamily::Evm,
        multichain_api: true,
        color: "#627EEA",
    },
    ChainDescriptor {
        id: ChainId::Polygon,
        name: "Polygon",
        short_name: "MATIC",
        api_url: "https://api.polygonscan.com/api",
        explorer_url: "https://polygonscan.com",
        family: ChainFamily::Evm,
        multichain_api: false,
        color: "#8247E5",
    },
    ChainDescriptor {
        id: ChainId::Bsc,
        name: "BNB Chain",
        short_name: "BSC",
        api_url: "https://api.bscscan.com/api",
        explorer_url: "https://bscscan.com",
        family: ChainFamily::Evm,
        multichain_api: false,
        color: "#F3BA2F",
    },
    ChainDescriptor {
        id: ChainId::Arbitrum,
        name: "Arbitrum One",
        short_name: "ARB",
        api_url: "https://api.arbiscan.io/api",
        explorer_url: "https://arbiscan.io",
        family: ChainFamily::Evm,
        multichain_api: false,
        color: "#28A0F0",
    },
    ChainDescriptor {
        id: ChainId::Optimism,
        name: "Optimism",
        short_name: "OP",
        api_url: "https://api-optimistic.etherscan.io/api",
        explorer_url: "https://optimistic.etherscan.io",
        family: ChainFamily::Evm,
        multichain_api: false,
        color: "#FF0420",
    },
    ChainDescriptor {
        id: ChainId::Base,
        name: "Base",
        short_name: "BASE",
        api_url: "https://api.basescan.org/api",
        explorer_url: "https://basescan.org",
        family: ChainFamily::Evm,
        multichain_api: false,
        color: "#0052FF",
    },
    ChainDescriptor {
        id: ChainId::Avalanche,
        name: "Avalanche",
        short_name: "AVAX",
        api_url: "https://api.snowtrace.io/api",
        explorer_url: "https://snowtrace.io",
        family: ChainFamily::Evm,
        multichain_api: false,
        color: "#E84142",
    },
    ChainDescriptor {
        id: ChainId::Solana,
        name: "Solana",
        short_name: "SOL",
        api_url: "https://pro-api.solscan.io/v1",
        explorer_url: "https://solscan.io",
        family: ChainFamily::Solana,
        multichain_api: false,
        color: "#14F195",
    },
];

/// Environment variable that seeds a chain's explorer key on startup
pub fn credential_env_var(chain: ChainId) -> &'static str {
    match chain {
        ChainId::Ethereum => "ETHERSCAN_API_KEY",
        ChainId::Polygon => "POLYGONSCAN_API_KEY",
        ChainId::Bsc => "BSCSCAN_API_KEY",
        ChainId::Arbitrum => "ARBISCAN_API_KEY",
        ChainId::Optimism => "OPTIMISM_API_KEY",
        ChainId::Base => "BASESCAN_API_KEY",
        ChainId::Avalanche => "SNOWTRACE_API_KEY",
        ChainId::Solana => "SOLSCAN_API_KEY",
    }
}
