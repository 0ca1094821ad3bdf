//! Solscan explorer strategy (Solana programs)
//!
//! API: `GET {base}/program/source?address=..` with header `token: {key}`
//! Response: `{"success":true,"data":{"programName":"..","source":".."}}`

use serde::Deserialize;
use std::time::Duration;

use super::explorer::ExplorerStrategy;
use super::transport::{HttpRequest, HttpResponse};
use crate::models::config::ChainDescriptor;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::ContractInfo;

const FALLBACK_PROGRAM_NAME: &str = "Solana Program";

#[derive(Debug, Deserialize)]
struct ProgramSourceResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ProgramSource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgramSource {
    #[serde(default)]
    program_name: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

pub struct SolscanExplorer;

impl ExplorerStrategy for SolscanExplorer {
    fn build_request(
        &self,
        chain: &ChainDescriptor,
        address: &str,
        api_key: &str,
        timeout: Duration,
    ) -> HttpRequest {
        HttpRequest::get(format!("{}/program/source", chain.api_url), timeout)
            .query("address", address)
            .header("token", api_key)
    }

    fn interpret(
        &self,
        chain: &ChainDescriptor,
        address: &str,
        response: HttpResponse,
    ) -> AppResult<ContractInfo> {
        match response.status {
            401 | 403 => {
                return Err(AppError::invalid_api_key(format!(
                    "The {} key provided is unauthorized or expired. Please verify it in your Solscan dashboard.",
                    chain.name
                )))
            }
            429 => {
                return Err(AppError::rate_limit(format!(
                    "Too many requests to {}. Please wait a moment or upgrade your API key plan.",
                    chain.name
                )))
            }
            _ => {}
        }

        let data: ProgramSourceResponse =
            serde_json::from_str(&response.body).map_err(|_| self.network_error(chain))?;

        let program = match data.data {
            Some(program) if data.success => program,
            _ => {
                return Err(AppError::not_found(format!(
                    "Solana program source not found for address {}.",
                    address
                )))
            }
        };

        let source = match program.source {
            Some(source) if !source.trim().is_empty() => source,
            _ => {
                return Err(AppError::not_verified(
                    "This Solana program is not verified. Youth requires verified source code for security analysis.",
                ))
            }
        };

        let name = program
            .program_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_PROGRAM_NAME.to_string());

        Ok(ContractInfo::verified(address, name, source, chain.id))
    }

    fn timeout_error(&self, chain: &ChainDescriptor) -> AppError {
        AppError::network_timeout(format!(
            "{} indexer is taking too long to respond. Please try again.",
            chain.name
        ))
    }

    fn network_error(&self, chain: &ChainDescriptor) -> AppError {
        AppError::network_error(format!(
            "Communication with {} failed. Check your connection.",
            chain.name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ChainId;
    use crate::models::errors::ErrorCode;

    const PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

    fn interpret(status: u16, body: &str) -> AppResult<ContractInfo> {
        SolscanExplorer.interpret(
            ChainId::Solana.descriptor(),
            PROGRAM,
            HttpResponse::new(status, body),
        )
    }

    #[test]
    fn test_request_shape() {
        let req = SolscanExplorer.build_request(
            ChainId::Solana.descriptor(),
            PROGRAM,
            "sol-key",
            Duration::from_secs(10),
        );
        assert_eq!(req.url, "https://pro-api.solscan.io/v1/program/source");
        assert_eq!(req.query_value("address"), Some(PROGRAM));
        assert_eq!(req.header_value("token"), Some("sol-key"));
        assert_eq!(req.query_value("apikey"), None);
    }

    #[test]
    fn test_verified_program() {
        let body = r#"{"success":true,"data":{"programName":"spl_token","source":"pub fn process() {}"}}"#;
        let info = interpret(200, body).unwrap();
        assert_eq!(info.name, "spl_token");
        assert_eq!(info.chain, ChainId::Solana);
        assert!(info.is_verified);
    }

    #[test]
    fn test_missing_name_falls_back() {
        let body = r#"{"success":true,"data":{"source":"pub fn process() {}"}}"#;
        assert_eq!(interpret(200, body).unwrap().name, "Solana Program");
    }

    #[test]
    fn test_unauthorized_statuses() {
        assert_eq!(interpret(401, "").unwrap_err().code, ErrorCode::InvalidApiKey);
        assert_eq!(interpret(403, "{}").unwrap_err().code, ErrorCode::InvalidApiKey);
    }

    #[test]
    fn test_throttled_is_rate_limit() {
        let err = interpret(429, "").unwrap_err();
        assert_eq!(err.code, ErrorCode::RateLimit);
        assert!(err.message.contains("Solana"));
    }

    #[test]
    fn test_empty_source_is_not_verified() {
        let body = r#"{"success":true,"data":{"programName":"x","source":""}}"#;
        assert_eq!(interpret(200, body).unwrap_err().code, ErrorCode::NotVerified);
    }

    #[test]
    fn test_unsuccessful_or_missing_data_is_not_found() {
        assert_eq!(
            interpret(200, r#"{"success":false}"#).unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(
            interpret(200, r#"{"success":true,"data":null}"#).unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[test]
    fn test_garbage_body_is_network_error() {
        assert_eq!(interpret(500, "oops").unwrap_err().code, ErrorCode::NetworkError);
    }
}
