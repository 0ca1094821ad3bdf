//! Youth Audit Library
//!
//! Multi-chain smart contract security auditing:
//! - Verified source retrieval from EVM explorers and Solscan
//! - Structured LLM audit (purpose, features, risks, verdict)
//! - Per-chain explorer credentials and a daily scan quota
//! - Follow-up chat about an audit

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    AuditService, ChatSession, CredentialStore, FlowState, ScanFlow, ScanOutcome, ScanReport,
    Services, UsageTracker,
};
pub use models::{
    AppConfig, AppError, AppResult, ChainDescriptor, ChainFamily, ChainId, ContractInfo,
    ErrorCode, RiskLevel, SecurityAudit, UsageRecord,
};
pub use providers::{
    GeminiClient, HttpRequest, HttpResponse, HttpTransport, LanguageModel, ReqwestTransport,
    SourceRetrievalService, TransportError,
};
pub use utils::{is_valid_address, FileStore, KeyValueStore, MemoryStore};
