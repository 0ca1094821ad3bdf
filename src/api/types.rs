//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::flow::ScanReport;
use crate::models::config::ChainDescriptor;
use crate::models::errors::AppError;
use crate::models::types::UsageRecord;

/// API Response wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Networks
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkData {
    #[serde(flatten)]
    pub descriptor: &'static ChainDescriptor,
    pub has_credential: bool,
}

// ============================================
// Credentials
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCredentialRequest {
    pub api_key: String,
}

/// Never carries the key itself
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatusData {
    pub chain: String,
    pub chain_name: String,
    pub configured: bool,
}

// ============================================
// Usage
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    #[serde(flatten)]
    pub record: UsageRecord,
    pub daily_limit: u32,
    /// Absent for Pro
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_scans: Option<u32>,
}

impl UsageData {
    pub fn new(record: UsageRecord, daily_limit: u32) -> Self {
        let remaining_scans = if record.is_pro {
            None
        } else {
            Some(daily_limit.saturating_sub(record.scans_used_today))
        };
        Self {
            record,
            daily_limit,
            remaining_scans,
        }
    }
}

// ============================================
// Audit
// ============================================

#[derive(Debug, Deserialize)]
pub struct AuditRequest {
    pub address: String,
    /// Chain id, short name or name
    pub chain: String,
}

pub type AuditData = ScanReport;

// ============================================
// Chat
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Omit to open a new session
    #[serde(default)]
    pub session_id: Option<uuid::Uuid>,
    pub message: String,
    /// Only used when opening a session
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatData {
    pub session_id: uuid::Uuid,
    /// Absent when the message was blank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    pub turns: usize,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: String,
    pub chat_sessions: usize,
}
