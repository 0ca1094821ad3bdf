//! Network registry types and runtime configuration
//!
//! Chain metadata lives in utils/constants.rs; this module gives it types
//! and reads the environment.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{
    credential_env_var, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, EXPLORER_TIMEOUT_MS,
    NETWORKS,
};

/// Address format and explorer API convention shared by a group of chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainFamily {
    Evm,
    Solana,
}

impl ChainFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Solana => "SOLANA",
        }
    }
}

/// Supported chains (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainId {
    Ethereum,
    Polygon,
    Bsc,
    Arbitrum,
    Optimism,
    Base,
    Avalanche,
    Solana,
}

impl ChainId {
    /// Every chain, in display order
    pub const ALL: [ChainId; 8] = [
        Self::Ethereum,
        Self::Polygon,
        Self::Bsc,
        Self::Arbitrum,
        Self::Optimism,
        Self::Base,
        Self::Avalanche,
        Self::Solana,
    ];

    /// Position in the chain table
    #[inline]
    pub const fn index(&self) -> usize {
        match self {
            Self::Ethereum => 0,
            Self::Polygon => 1,
            Self::Bsc => 2,
            Self::Arbitrum => 3,
            Self::Optimism => 4,
            Self::Base => 5,
            Self::Avalanche => 6,
            Self::Solana => 7,
        }
    }

    /// Chain identifier as used by explorer APIs and storage keys
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Ethereum => "1",
            Self::Polygon => "137",
            Self::Bsc => "56",
            Self::Arbitrum => "42161",
            Self::Optimism => "10",
            Self::Base => "8453",
            Self::Avalanche => "43114",
            Self::Solana => "solana",
        }
    }

    /// O(1) registry lookup
    #[inline]
    pub fn descriptor(&self) -> &'static ChainDescriptor {
        &NETWORKS[self.index()]
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn family(&self) -> ChainFamily {
        self.descriptor().family
    }

    /// All descriptors in display order
    pub fn all_descriptors() -> &'static [ChainDescriptor] {
        &NETWORKS
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ChainId {
    type Err = AppError;

    /// Accepts the identifier ("137"), the short code ("MATIC") or the name ("polygon")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ChainId::ALL
            .iter()
            .copied()
            .find(|chain| {
                let d = chain.descriptor();
                chain.id().eq_ignore_ascii_case(needle)
                    || d.short_name.eq_ignore_ascii_case(needle)
                    || d.name.eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| {
                AppError::new(
                    ErrorCode::ConfigInvalidValue,
                    format!("Unsupported chain: {}", needle),
                )
            })
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable per-chain metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub id: ChainId,
    pub name: &'static str,
    pub short_name: &'static str,
    /// Explorer API base URL
    pub api_url: &'static str,
    /// Explorer web URL
    pub explorer_url: &'static str,
    pub family: ChainFamily,
    /// Endpoint serves several chains and needs a `chainid` parameter
    pub multichain_api: bool,
    pub color: &'static str,
}

impl ChainDescriptor {
    /// Explorer page for an address
    pub fn explorer_address_url(&self, address: &str) -> String {
        match self.family {
            ChainFamily::Evm => format!("{}/address/{}", self.explorer_url, address),
            ChainFamily::Solana => format!("{}/account/{}", self.explorer_url, address),
        }
    }

    /// Environment variable that can seed this chain's explorer key
    pub fn credential_env_var(&self) -> &'static str {
        credential_env_var(self.id)
    }
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Gemini API key (never logged)
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Durable key-value file
    pub data_file: PathBuf,
    pub host: String,
    pub port: u16,
    pub explorer_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            data_file: PathBuf::from("./youth_data.json"),
            host: "0.0.0.0".to_string(),
            port: 8080,
            explorer_timeout: Duration::from_millis(EXPLORER_TIMEOUT_MS),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        if gemini_api_key.is_some() {
            info!("🔑 GEMINI_API_KEY configured (key hidden)");
        }

        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("YOUTH_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            gemini_api_key,
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            data_file: std::env::var("YOUTH_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            host: std::env::var("YOUTH_HOST").unwrap_or(defaults.host),
            port,
            explorer_timeout: defaults.explorer_timeout,
        }
    }

    /// Gemini key or a config error
    pub fn require_gemini_key(&self) -> AppResult<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| AppError::missing_env("GEMINI_API_KEY"))
    }

    /// Explorer keys present in the environment
    pub fn explorer_keys_from_env() -> Vec<(ChainId, String)> {
        ChainId::ALL
            .iter()
            .filter_map(|chain| {
                std::env::var(credential_env_var(*chain))
                    .ok()
                    .filter(|k| !k.trim().is_empty())
                    .map(|k| (*chain, k))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_chain_resolves_to_complete_descriptor() {
        for chain in ChainId::ALL {
            let d = chain.descriptor();
            assert_eq!(d.id, chain);
            assert!(!d.name.is_empty());
            assert!(!d.api_url.is_empty());
            assert!(!d.explorer_url.is_empty());
            assert!(!d.short_name.is_empty());
        }
    }

    #[test]
    fn test_enumeration_is_stable_display_order() {
        let names: Vec<_> = ChainId::all_descriptors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "Ethereum",
                "Polygon",
                "BNB Chain",
                "Arbitrum One",
                "Optimism",
                "Base",
                "Avalanche",
                "Solana"
            ]
        );
    }

    #[test]
    fn test_chain_from_str_variants() {
        assert_eq!("137".parse::<ChainId>().unwrap(), ChainId::Polygon);
        assert_eq!("bsc".parse::<ChainId>().unwrap(), ChainId::Bsc);
        assert_eq!("Arbitrum One".parse::<ChainId>().unwrap(), ChainId::Arbitrum);
        assert_eq!("SOL".parse::<ChainId>().unwrap(), ChainId::Solana);
        assert!("dogechain".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_chain_serde_uses_identifier() {
        let json = serde_json::to_string(&ChainId::Base).unwrap();
        assert_eq!(json, "\"8453\"");
        let back: ChainId = serde_json::from_str("\"solana\"").unwrap();
        assert_eq!(back, ChainId::Solana);
    }

    #[test]
    fn test_explorer_address_url() {
        assert_eq!(
            ChainId::Ethereum.descriptor().explorer_address_url("0xabc"),
            "https://etherscan.io/address/0xabc"
        );
        assert_eq!(
            ChainId::Solana.descriptor().explorer_address_url("Prog111"),
            "https://solscan.io/account/Prog111"
        );
    }
}
