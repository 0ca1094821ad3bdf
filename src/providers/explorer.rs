//! Source Retrieval Service
//!
//! Dispatches to the chain family's explorer strategy and normalizes every
//! outcome into `ContractInfo` or a typed `AppError`.
//!
//! - Missing credential short-circuits before any request is issued
//! - One attempt per call; retries are a user re-trigger of the whole flow
//! - Every call is bounded by the explorer timeout (10s)

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::etherscan::EtherscanExplorer;
use super::solscan::SolscanExplorer;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::core::credentials::CredentialStore;
use crate::models::config::{ChainDescriptor, ChainFamily, ChainId};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::ContractInfo;
use crate::utils::constants::EXPLORER_TIMEOUT_MS;

/// Request shape and response taxonomy for one chain family
pub trait ExplorerStrategy: Send + Sync {
    fn build_request(
        &self,
        chain: &ChainDescriptor,
        address: &str,
        api_key: &str,
        timeout: Duration,
    ) -> HttpRequest;

    fn interpret(
        &self,
        chain: &ChainDescriptor,
        address: &str,
        response: HttpResponse,
    ) -> AppResult<ContractInfo>;

    fn timeout_error(&self, chain: &ChainDescriptor) -> AppError;

    fn network_error(&self, chain: &ChainDescriptor) -> AppError;
}

/// Strategy for a family. Adding a family adds one arm here.
pub fn strategy_for(family: ChainFamily) -> &'static dyn ExplorerStrategy {
    match family {
        ChainFamily::Evm => &EtherscanExplorer,
        ChainFamily::Solana => &SolscanExplorer,
    }
}

#[derive(Clone)]
pub struct SourceRetrievalService {
    transport: Arc<dyn HttpTransport>,
    credentials: CredentialStore,
    timeout: Duration,
}

impl SourceRetrievalService {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: CredentialStore) -> Self {
        Self {
            transport,
            credentials,
            timeout: Duration::from_millis(EXPLORER_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Fetch verified source for `address` on `chain`
    pub async fn fetch_source_code(&self, address: &str, chain: ChainId) -> AppResult<ContractInfo> {
        let descriptor = chain.descriptor();
        let api_key = self.credentials.get(chain);

        if api_key.is_empty() {
            warn!(chain = %descriptor.name, "🔑 No explorer key configured");
            return Err(AppError::missing_api_key(descriptor.name));
        }

        let strategy = strategy_for(descriptor.family);
        let request = strategy.build_request(descriptor, address, &api_key, self.timeout);

        info!(chain = %descriptor.name, %address, "🔍 Fetching verified source");
        let start = Instant::now();

        let response = match tokio::time::timeout(self.timeout, self.transport.get(request)).await {
            Err(_) | Ok(Err(TransportError::Timeout)) => {
                warn!(chain = %descriptor.name, timeout_ms = self.timeout.as_millis() as u64, "⏱️ Explorer timed out");
                return Err(strategy.timeout_error(descriptor));
            }
            Ok(Err(TransportError::Network(msg))) => {
                warn!(chain = %descriptor.name, error = %msg, "❌ Explorer unreachable");
                return Err(strategy.network_error(descriptor));
            }
            Ok(Ok(response)) => response,
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        match strategy.interpret(descriptor, address, response) {
            Ok(info) => {
                info!(
                    chain = %descriptor.name,
                    contract = %info.name,
                    bytes = info.source_code.len(),
                    latency_ms,
                    "✅ Verified source retrieved"
                );
                Ok(info)
            }
            Err(e) => {
                warn!(chain = %descriptor.name, kind = e.code_str(), latency_ms, "Retrieval failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use crate::utils::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const ADDR: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

    /// Scripted transport that records requests
    struct Scripted {
        reply: Result<HttpResponse, TransportError>,
        calls: AtomicUsize,
        last: Mutex<Option<HttpRequest>>,
    }

    impl Scripted {
        fn new(reply: Result<HttpResponse, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for Scripted {
        async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request);
            self.reply.clone()
        }
    }

    struct NeverResolves;

    #[async_trait]
    impl HttpTransport for NeverResolves {
        async fn get(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            std::future::pending().await
        }
    }

    fn service(transport: Arc<dyn HttpTransport>, keys: &[(ChainId, &str)]) -> SourceRetrievalService {
        let creds = CredentialStore::new(Arc::new(MemoryStore::new()));
        for (chain, key) in keys {
            creds.set(*chain, key).unwrap();
        }
        SourceRetrievalService::new(transport, creds)
    }

    #[test]
    fn test_strategy_dispatch_by_family() {
        let evm = strategy_for(ChainFamily::Evm).build_request(
            ChainId::Base.descriptor(),
            ADDR,
            "k",
            Duration::from_secs(1),
        );
        assert!(evm.query_value("apikey").is_some());

        let sol = strategy_for(ChainFamily::Solana).build_request(
            ChainId::Solana.descriptor(),
            "Prog",
            "k",
            Duration::from_secs(1),
        );
        assert_eq!(sol.header_value("token"), Some("k"));
    }

    #[tokio::test]
    async fn test_missing_key_issues_no_request() {
        let transport = Scripted::new(Ok(HttpResponse::ok("{}")));
        let svc = service(transport.clone(), &[]);

        let err = svc.fetch_source_code(ADDR, ChainId::Ethereum).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingApiKey);
        assert!(err.message.contains("Ethereum"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_uses_stored_key_and_timeout() {
        let body = r#"{"status":"1","message":"OK","result":[{"SourceCode":"contract A {}","ContractName":"A"}]}"#;
        let transport = Scripted::new(Ok(HttpResponse::ok(body)));
        let svc = service(transport.clone(), &[(ChainId::Ethereum, "ETHKEY")]);

        let info = svc.fetch_source_code(ADDR, ChainId::Ethereum).await.unwrap();
        assert_eq!(info.name, "A");

        let sent = transport.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.query_value("apikey"), Some("ETHKEY"));
        assert_eq!(sent.query_value("chainid"), Some("1"));
        assert_eq!(sent.timeout, Duration::from_millis(10_000));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_source_code_never_yields_contract() {
        let body = r#"{"status":"1","message":"OK","result":[{"SourceCode":"","ContractName":"A"}]}"#;
        let svc = service(
            Scripted::new(Ok(HttpResponse::ok(body))),
            &[(ChainId::Polygon, "k")],
        );
        let err = svc.fetch_source_code(ADDR, ChainId::Polygon).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotVerified);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_transport_times_out() {
        let svc = service(Arc::new(NeverResolves), &[(ChainId::Ethereum, "k")]);
        let err = svc.fetch_source_code(ADDR, ChainId::Ethereum).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NetworkTimeout);
    }

    #[tokio::test]
    async fn test_transport_timeout_and_network_errors_are_distinct() {
        let timed_out = service(
            Scripted::new(Err(TransportError::Timeout)),
            &[(ChainId::Solana, "k")],
        );
        assert_eq!(
            timed_out
                .fetch_source_code("Prog", ChainId::Solana)
                .await
                .unwrap_err()
                .code,
            ErrorCode::NetworkTimeout
        );

        let refused = service(
            Scripted::new(Err(TransportError::Network("connection refused".into()))),
            &[(ChainId::Solana, "k")],
        );
        assert_eq!(
            refused
                .fetch_source_code("Prog", ChainId::Solana)
                .await
                .unwrap_err()
                .code,
            ErrorCode::NetworkError
        );
    }
}
