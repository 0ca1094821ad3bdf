//! Shared mocks for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use youth_audit::{
    AppConfig, AppError, AppResult, AuditService, CredentialStore, HttpRequest, HttpResponse,
    HttpTransport, LanguageModel, MemoryStore, ScanFlow, SourceRetrievalService, TransportError,
    UsageTracker,
};
use youth_audit::providers::GenerationRequest;

pub const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
pub const SPL_TOKEN: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

pub const VERIFIED_EVM: &str = r#"{"status":"1","message":"OK","result":[{"SourceCode":"contract TetherToken { function pause() onlyOwner {} }","ContractName":"TetherToken"}]}"#;

pub fn audit_json(risk: &str) -> String {
    format!(
        r#"{{
            "contractPurpose": "Stablecoin token",
            "keyFeatures": ["transfer", "pause", "blacklist"],
            "securityRisks": {{
                "canDrainWallets": {{"status": false, "explanation": "No arbitrary transfers"}},
                "adminPowers": ["pause", "blacklist", "issue"],
                "isPausable": {{"status": true, "explanation": "Owner can pause"}},
                "isUpgradeable": {{"status": true, "explanation": "Deprecation forwarding"}},
                "hiddenFees": {{"status": false, "explanation": "Fee is zero"}}
            }},
            "riskLevel": "{}",
            "verdict": "Centralised control"
        }}"#,
        risk
    )
}

/// Transport returning one scripted reply and counting calls
pub struct MockTransport {
    reply: Result<HttpResponse, TransportError>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn replying(reply: Result<HttpResponse, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(body: &str) -> Arc<Self> {
        Self::replying(Ok(HttpResponse::ok(body)))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.reply.clone()
    }
}

/// Model returning a fixed reply (or failure) and counting calls
pub struct MockModel {
    reply: Result<String, String>,
    pub calls: AtomicUsize,
}

impl MockModel {
    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, _request: GenerationRequest) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(AppError::analysis_failed)
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub credentials: CredentialStore,
    pub usage: UsageTracker,
    pub flow: ScanFlow,
}

pub fn harness(transport: Arc<dyn HttpTransport>, model: Arc<dyn LanguageModel>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let credentials = CredentialStore::new(store.clone());
    let usage = UsageTracker::with_clock(store.clone(), Arc::new(today));
    let retrieval = SourceRetrievalService::new(transport, credentials.clone())
        .with_timeout(AppConfig::default().explorer_timeout);
    let flow = ScanFlow::new(retrieval, AuditService::new(model), usage.clone());
    Harness {
        store,
        credentials,
        usage,
        flow,
    }
}
