//! Orchestration Flow
//!
//! IDLE → VALIDATING → QUOTA_CHECK → FETCHING → ANALYZING → DONE, with ERROR
//! reachable from every step. Failures are caught here exactly once and
//! mapped to an outcome; nothing is retried automatically.

use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use super::auditor::AuditService;
use super::usage::UsageTracker;
use crate::models::config::ChainId;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{ContractInfo, SecurityAudit, UsageRecord};
use crate::providers::explorer::SourceRetrievalService;
use crate::utils::validator::is_valid_address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    Idle,
    Validating,
    QuotaCheck,
    Fetching,
    Analyzing,
    Done,
    Error,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "IDLE",
            FlowState::Validating => "VALIDATING",
            FlowState::QuotaCheck => "QUOTA_CHECK",
            FlowState::Fetching => "FETCHING",
            FlowState::Analyzing => "ANALYZING",
            FlowState::Done => "DONE",
            FlowState::Error => "ERROR",
        }
    }
}

/// How a scan ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Completed {
        contract: ContractInfo,
        audit: SecurityAudit,
    },
    /// Daily quota exhausted. Not an error.
    #[serde(rename_all = "camelCase")]
    UpgradeRequired { stats: UsageRecord },
    InvalidAddress { message: String },
    #[serde(rename_all = "camelCase")]
    Failed {
        kind: ErrorCode,
        message: String,
        /// Send the user to credential configuration
        prompt_credentials: bool,
        /// Re-running the scan may succeed
        retryable: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub final_state: FlowState,
    pub outcome: ScanOutcome,
    /// States visited, in order, starting at IDLE
    pub trail: Vec<FlowState>,
    /// Usage after the flow; absent if the store could not be read
    pub stats: Option<UsageRecord>,
    pub latency_ms: u64,
}

impl ScanReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, ScanOutcome::Completed { .. })
    }
}

/// Single-flow scan driver. Callers serialise runs.
#[derive(Clone)]
pub struct ScanFlow {
    retrieval: SourceRetrievalService,
    auditor: AuditService,
    usage: UsageTracker,
}

struct Trail {
    states: Vec<FlowState>,
}

impl Trail {
    fn new() -> Self {
        Self {
            states: vec![FlowState::Idle],
        }
    }

    fn enter(&mut self, state: FlowState) {
        tracing::debug!(state = state.as_str(), "flow");
        self.states.push(state);
    }

    fn current(&self) -> FlowState {
        self.states.last().copied().unwrap_or(FlowState::Idle)
    }
}

impl ScanFlow {
    pub fn new(retrieval: SourceRetrievalService, auditor: AuditService, usage: UsageTracker) -> Self {
        Self {
            retrieval,
            auditor,
            usage,
        }
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn auditor(&self) -> &AuditService {
        &self.auditor
    }

    pub fn retrieval(&self) -> &SourceRetrievalService {
        &self.retrieval
    }

    /// Run one scan to completion
    pub async fn run(&self, address: &str, chain: ChainId) -> ScanReport {
        let start = Instant::now();
        let address = address.trim();
        let mut trail = Trail::new();

        let outcome = self.drive(address, chain, &mut trail).await;

        let final_state = match &outcome {
            ScanOutcome::Completed { .. } => FlowState::Done,
            ScanOutcome::UpgradeRequired { .. } => FlowState::Idle,
            ScanOutcome::InvalidAddress { .. } | ScanOutcome::Failed { .. } => FlowState::Error,
        };
        if trail.current() != final_state {
            trail.enter(final_state);
        }

        let stats = self.usage.get_stats().ok();
        let latency_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            ScanOutcome::Completed { contract, audit } => info!(
                chain = %chain,
                contract = %contract.name,
                risk = audit.risk_level.as_str(),
                latency_ms,
                "✅ Scan complete"
            ),
            ScanOutcome::UpgradeRequired { .. } => info!(chain = %chain, "🔒 Daily limit reached"),
            ScanOutcome::InvalidAddress { message } => warn!(chain = %chain, %address, "{}", message),
            ScanOutcome::Failed { kind, message, .. } => {
                warn!(chain = %chain, kind = kind.as_str(), latency_ms, "❌ Scan failed: {}", message)
            }
        }

        ScanReport {
            final_state,
            outcome,
            trail: trail.states,
            stats,
            latency_ms,
        }
    }

    async fn drive(&self, address: &str, chain: ChainId, trail: &mut Trail) -> ScanOutcome {
        trail.enter(FlowState::Validating);
        if !is_valid_address(address, chain) {
            return ScanOutcome::InvalidAddress {
                message: format!(
                    "INVALID {} ADDRESS FORMAT",
                    chain.descriptor().short_name.to_uppercase()
                ),
            };
        }

        trail.enter(FlowState::QuotaCheck);
        match self.usage.check_quota() {
            Ok((true, _)) => {}
            Ok((false, stats)) => return ScanOutcome::UpgradeRequired { stats },
            Err(e) => return failed(e),
        }

        match self.fetch_and_analyze(address, chain, trail).await {
            Ok((contract, audit)) => {
                if let Err(e) = self.usage.increment_scan() {
                    warn!(error = %e, "Scan succeeded but usage could not be recorded");
                }
                trail.enter(FlowState::Done);
                ScanOutcome::Completed { contract, audit }
            }
            Err(e) => failed(e),
        }
    }

    async fn fetch_and_analyze(
        &self,
        address: &str,
        chain: ChainId,
        trail: &mut Trail,
    ) -> AppResult<(ContractInfo, SecurityAudit)> {
        trail.enter(FlowState::Fetching);
        let contract = self.retrieval.fetch_source_code(address, chain).await?;

        trail.enter(FlowState::Analyzing);
        let audit = self
            .auditor
            .analyze_contract(&contract.name, &contract.source_code)
            .await?;

        Ok((contract, audit))
    }

    /// Unlock unlimited scans, returning fresh stats
    pub fn upgrade(&self) -> AppResult<UsageRecord> {
        self.usage.upgrade_to_pro()
    }
}

fn failed(e: AppError) -> ScanOutcome {
    ScanOutcome::Failed {
        kind: e.code,
        prompt_credentials: e.requires_credential_setup(),
        retryable: e.is_retryable(),
        message: e.message,
    }
}
