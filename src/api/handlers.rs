//! API Request Handlers

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore, TryAcquireError};
use tracing::{info, warn};
use uuid::Uuid;

use super::types::*;
use crate::core::auditor::{ChatSession, GENERAL_CHAT_CONTEXT};
use crate::core::credentials::CredentialStore;
use crate::core::flow::ScanFlow;
use crate::models::config::ChainId;
use crate::models::errors::AppError;
use crate::utils::constants::MAX_CHAT_SESSIONS;

type ApiReject = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiReject>;

/// Open conversation plus its last activity
pub struct ChatSlot {
    pub session: Arc<Mutex<ChatSession>>,
    pub last_used: Instant,
}

/// Shared application state
pub struct AppState {
    pub flow: ScanFlow,
    pub credentials: CredentialStore,
    pub chats: DashMap<Uuid, ChatSlot>,
    pub max_chats: usize,
    pub model_name: String,
    pub start_time: Instant,
    /// One scan at a time; quota read-then-write is not otherwise guarded
    pub scan_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(flow: ScanFlow, credentials: CredentialStore, model_name: impl Into<String>) -> Self {
        Self {
            flow,
            credentials,
            chats: DashMap::new(),
            max_chats: MAX_CHAT_SESSIONS,
            model_name: model_name.into(),
            start_time: Instant::now(),
            scan_semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn with_chat_limit(mut self, max_chats: usize) -> Self {
        self.max_chats = max_chats.max(1);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Drop conversations idle for at least `max_idle`, returns how many were removed
    pub fn evict_idle_chats(&self, max_idle: Duration) -> usize {
        let before = self.chats.len();
        self.chats.retain(|_, slot| slot.last_used.elapsed() < max_idle);
        before.saturating_sub(self.chats.len())
    }

    fn open_chat(&self, session: ChatSession) -> (Uuid, Arc<Mutex<ChatSession>>) {
        while self.chats.len() >= self.max_chats {
            let oldest = self
                .chats
                .iter()
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| *entry.key());
            match oldest {
                Some(id) => {
                    self.chats.remove(&id);
                    info!(session = %id, "💬 Chat session evicted (limit reached)");
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(session));
        self.chats.insert(
            id,
            ChatSlot {
                session: session.clone(),
                last_used: Instant::now(),
            },
        );
        (id, session)
    }

    fn touch_chat(&self, id: &Uuid) -> Option<Arc<Mutex<ChatSession>>> {
        self.chats.get_mut(id).map(|mut slot| {
            slot.last_used = Instant::now();
            slot.session.clone()
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn reject(err: AppError, start: Instant) -> ApiReject {
    let status = StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(&err), elapsed_ms(start))),
    )
}

fn parse_chain(raw: &str, start: Instant) -> Result<ChainId, ApiReject> {
    raw.parse::<ChainId>()
        .map_err(|e| reject(AppError::bad_request(e.message), start))
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        model: state.model_name.clone(),
        chat_sessions: state.chats.len(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Networks
// ============================================

pub async fn list_networks(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<NetworkData>>> {
    let start = Instant::now();

    let data = ChainId::ALL
        .iter()
        .map(|chain| NetworkData {
            descriptor: chain.descriptor(),
            has_credential: state.credentials.is_configured(*chain),
        })
        .collect();

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Credentials
// ============================================

pub async fn set_credential(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
    Json(req): Json<SetCredentialRequest>,
) -> ApiResult<CredentialStatusData> {
    let start = Instant::now();
    let chain = parse_chain(&chain, start)?;

    let key = req.api_key.trim();
    if key.is_empty() {
        return Err(reject(AppError::bad_request("apiKey must not be empty"), start));
    }

    state
        .credentials
        .set(chain, key)
        .map_err(|e| reject(e, start))?;

    Ok(Json(ApiResponse::success(
        CredentialStatusData {
            chain: chain.id().to_string(),
            chain_name: chain.name().to_string(),
            configured: true,
        },
        elapsed_ms(start),
    )))
}

pub async fn get_credential(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
) -> ApiResult<CredentialStatusData> {
    let start = Instant::now();
    let chain = parse_chain(&chain, start)?;

    Ok(Json(ApiResponse::success(
        CredentialStatusData {
            chain: chain.id().to_string(),
            chain_name: chain.name().to_string(),
            configured: state.credentials.is_configured(chain),
        },
        elapsed_ms(start),
    )))
}

// ============================================
// Usage
// ============================================

pub async fn get_usage(State(state): State<Arc<AppState>>) -> ApiResult<UsageData> {
    let start = Instant::now();
    let usage = state.flow.usage();
    let record = usage.get_stats().map_err(|e| reject(e, start))?;

    Ok(Json(ApiResponse::success(
        UsageData::new(record, usage.daily_limit()),
        elapsed_ms(start),
    )))
}

pub async fn upgrade(State(state): State<Arc<AppState>>) -> ApiResult<UsageData> {
    let start = Instant::now();
    let record = state.flow.upgrade().map_err(|e| reject(e, start))?;

    Ok(Json(ApiResponse::success(
        UsageData::new(record, state.flow.usage().daily_limit()),
        elapsed_ms(start),
    )))
}

// ============================================
// Audit
// ============================================

/// Runs the full scan flow. Every flow outcome is a 200 with the report;
/// only request problems and a concurrent scan are rejected.
pub async fn run_audit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<AuditData> {
    let start = Instant::now();
    let chain = parse_chain(&req.chain, start)?;

    let _permit = state
        .scan_semaphore
        .clone()
        .try_acquire_owned()
        .map_err(|e| match e {
            TryAcquireError::NoPermits => {
                warn!(chain = %chain, "Scan rejected, another scan is in progress");
                reject(AppError::conflict("A scan is already in progress. Please wait."), start)
            }
            TryAcquireError::Closed => {
                reject(AppError::internal("Scanning is shutting down"), start)
            }
        })?;

    let report = state.flow.run(&req.address, chain).await;
    info!(
        chain = %chain,
        state = report.final_state.as_str(),
        latency_ms = report.latency_ms,
        "🛡️ Audit request finished"
    );

    Ok(Json(ApiResponse::success(report, elapsed_ms(start))))
}

// ============================================
// Chat
// ============================================

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<ChatData> {
    let start = Instant::now();

    let (session_id, session) = match req.session_id {
        Some(id) => {
            let session = state
                .touch_chat(&id)
                .ok_or_else(|| reject(AppError::not_found(format!("Unknown chat session {}", id)), start))?;
            (id, session)
        }
        None => {
            if req.message.trim().is_empty() {
                return Err(reject(AppError::bad_request("message must not be empty"), start));
            }
            let context = req
                .context
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(GENERAL_CHAT_CONTEXT);
            let (id, session) = state.open_chat(state.flow.auditor().create_chat(Some(context)));
            info!(session = %id, "💬 Chat session opened");
            (id, session)
        }
    };

    // One outstanding request per conversation
    let mut session = session.try_lock().map_err(|_| {
        reject(
            AppError::conflict("This conversation is still waiting for a reply."),
            start,
        )
    })?;

    let reply = session.send(&req.message).await;
    let turns = session.history().len();

    Ok(Json(ApiResponse::success(
        ChatData {
            session_id,
            reply,
            turns,
        },
        elapsed_ms(start),
    )))
}

pub async fn close_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<ChatData> {
    let start = Instant::now();
    let (_, slot) = state
        .chats
        .remove(&id)
        .ok_or_else(|| reject(AppError::not_found(format!("Unknown chat session {}", id)), start))?;
    let turns = slot.session.lock().await.history().len();
    info!(session = %id, turns, "💬 Chat session closed");

    Ok(Json(ApiResponse::success(
        ChatData {
            session_id: id,
            reply: None,
            turns,
        },
        elapsed_ms(start),
    )))
}
