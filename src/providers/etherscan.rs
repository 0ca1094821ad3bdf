//! Etherscan-family explorer strategy (EVM chains)
//!
//! API: `GET {base}?[chainid=..&]module=contract&action=getsourcecode&address=..&apikey=..`
//!
//! Success: `{"status":"1","message":"OK","result":[{"SourceCode":"..","ContractName":".."}]}`
//! Failure: `{"status":"0","message":"NOTOK","result":"Invalid API Key"}`

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::explorer::ExplorerStrategy;
use super::transport::{HttpRequest, HttpResponse};
use crate::models::config::ChainDescriptor;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::ContractInfo;

const FALLBACK_CONTRACT_NAME: &str = "Unknown Contract";

#[derive(Debug, Deserialize)]
struct GetSourceCodeResponse {
    #[serde(default)]
    status: Value,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl GetSourceCodeResponse {
    fn is_ok(&self) -> bool {
        match &self.status {
            Value::String(s) => s == "1",
            Value::Number(n) => n.as_u64() == Some(1),
            _ => false,
        }
    }

    /// Error text: a string `result` wins over `message`
    fn error_text(&self) -> &str {
        match &self.result {
            Value::String(s) if !s.is_empty() => s,
            _ => &self.message,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceEntry {
    #[serde(default)]
    source_code: String,
    #[serde(default)]
    contract_name: String,
}

pub struct EtherscanExplorer;

impl ExplorerStrategy for EtherscanExplorer {
    fn build_request(
        &self,
        chain: &ChainDescriptor,
        address: &str,
        api_key: &str,
        timeout: Duration,
    ) -> HttpRequest {
        let mut request = HttpRequest::get(chain.api_url, timeout);
        if chain.multichain_api {
            request = request.query("chainid", chain.id.id());
        }
        request
            .query("module", "contract")
            .query("action", "getsourcecode")
            .query("address", address)
            .query("apikey", api_key)
    }

    fn interpret(
        &self,
        chain: &ChainDescriptor,
        address: &str,
        response: HttpResponse,
    ) -> AppResult<ContractInfo> {
        if response.status == 429 {
            return Err(self.rate_limited(chain));
        }

        let data: GetSourceCodeResponse = serde_json::from_str(&response.body).map_err(|e| {
            debug!(error = %e, status = response.status, "Explorer body is not JSON");
            self.network_error(chain)
        })?;

        let first = match &data.result {
            Value::Array(items) if data.is_ok() => items.first(),
            _ => None,
        };

        if let Some(entry) = first {
            let entry: SourceEntry = serde_json::from_value(entry.clone()).unwrap_or_default();

            if entry.source_code.trim().is_empty() {
                return Err(AppError::not_verified(format!(
                    "Source code for {} is not verified on {}. Youth cannot audit unverified bytecode.",
                    address, chain.name
                )));
            }

            let name = if entry.contract_name.trim().is_empty() {
                FALLBACK_CONTRACT_NAME.to_string()
            } else {
                entry.contract_name
            };

            return Ok(ContractInfo::verified(address, name, entry.source_code, chain.id));
        }

        let error_text = data.error_text();
        let lowered = error_text.to_lowercase();

        if lowered.contains("invalid api key") {
            return Err(AppError::invalid_api_key(format!(
                "Your {} API Key was rejected. Please update it in settings with a valid key from your {}scan account.",
                chain.name, chain.short_name
            )));
        }

        if lowered.contains("rate limit") {
            return Err(self.rate_limited(chain));
        }

        Err(AppError::indexer_error(format!(
            "{} returned an error: {}",
            chain.name, error_text
        )))
    }

    fn timeout_error(&self, chain: &ChainDescriptor) -> AppError {
        AppError::network_timeout(format!("{} indexer connection timed out.", chain.name))
    }

    fn network_error(&self, chain: &ChainDescriptor) -> AppError {
        AppError::network_error(format!(
            "Unable to communicate with {} infrastructure.",
            chain.name
        ))
    }
}

impl EtherscanExplorer {
    fn rate_limited(&self, chain: &ChainDescriptor) -> AppError {
        AppError::rate_limit(format!(
            "Too many requests to {}. Please wait a moment or upgrade your API key plan.",
            chain.name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ChainId;
    use crate::models::errors::ErrorCode;

    const ADDR: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    fn interpret(chain: ChainId, status: u16, body: &str) -> AppResult<ContractInfo> {
        EtherscanExplorer.interpret(chain.descriptor(), ADDR, HttpResponse::new(status, body))
    }

    #[test]
    fn test_aggregator_request_carries_chainid() {
        let req = EtherscanExplorer.build_request(
            ChainId::Ethereum.descriptor(),
            ADDR,
            "KEY",
            Duration::from_secs(10),
        );
        assert_eq!(req.url, "https://api.etherscan.io/v2/api");
        assert_eq!(req.query_value("chainid"), Some("1"));
        assert_eq!(req.query_value("module"), Some("contract"));
        assert_eq!(req.query_value("action"), Some("getsourcecode"));
        assert_eq!(req.query_value("address"), Some(ADDR));
        assert_eq!(req.query_value("apikey"), Some("KEY"));
        assert_eq!(req.query[0].0, "chainid");
    }

    #[test]
    fn test_legacy_request_has_no_chainid() {
        let req = EtherscanExplorer.build_request(
            ChainId::Polygon.descriptor(),
            ADDR,
            "KEY",
            Duration::from_secs(10),
        );
        assert_eq!(req.url, "https://api.polygonscan.com/api");
        assert_eq!(req.query_value("chainid"), None);
        assert_eq!(req.query_value("apikey"), Some("KEY"));
    }

    #[test]
    fn test_verified_source() {
        let body = r#"{"status":"1","message":"OK","result":[{"SourceCode":"contract T {}","ContractName":"TetherToken"}]}"#;
        let info = interpret(ChainId::Ethereum, 200, body).unwrap();
        assert_eq!(info.name, "TetherToken");
        assert_eq!(info.source_code, "contract T {}");
        assert!(info.is_verified);
        assert_eq!(info.chain, ChainId::Ethereum);
    }

    #[test]
    fn test_missing_name_falls_back() {
        let body = r#"{"status":"1","message":"OK","result":[{"SourceCode":"contract T {}","ContractName":""}]}"#;
        let info = interpret(ChainId::Base, 200, body).unwrap();
        assert_eq!(info.name, "Unknown Contract");
    }

    #[test]
    fn test_empty_source_is_not_verified() {
        let body = r#"{"status":"1","message":"OK","result":[{"SourceCode":"","ContractName":""}]}"#;
        let err = interpret(ChainId::Ethereum, 200, body).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotVerified);
        assert!(err.message.contains(ADDR));
    }

    #[test]
    fn test_invalid_api_key_text() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key (#err2)|x"}"#;
        let err = interpret(ChainId::Polygon, 200, body).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidApiKey);
        assert!(err.message.contains("MATICscan"));
    }

    #[test]
    fn test_rate_limit_text_and_status() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#;
        assert_eq!(
            interpret(ChainId::Bsc, 200, body).unwrap_err().code,
            ErrorCode::RateLimit
        );
        assert_eq!(
            interpret(ChainId::Bsc, 429, "Too Many Requests").unwrap_err().code,
            ErrorCode::RateLimit
        );
    }

    #[test]
    fn test_uncategorized_error_is_indexer_error() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid Address format"}"#;
        let err = interpret(ChainId::Arbitrum, 200, body).unwrap_err();
        assert_eq!(err.code, ErrorCode::IndexerError);
        assert_eq!(err.message, "Arbitrum One returned an error: Invalid Address format");
    }

    #[test]
    fn test_message_used_when_result_not_string() {
        let body = r#"{"status":"0","message":"Query Timeout occured","result":[]}"#;
        let err = interpret(ChainId::Optimism, 200, body).unwrap_err();
        assert_eq!(err.code, ErrorCode::IndexerError);
        assert!(err.message.ends_with("Query Timeout occured"));
    }

    #[test]
    fn test_non_json_body_is_network_error() {
        let err = interpret(ChainId::Avalanche, 502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkError);
    }
}
