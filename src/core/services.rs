//! Service wiring shared by the CLI and the API server

use std::sync::Arc;
use tracing::{info, warn};

use super::auditor::AuditService;
use super::credentials::CredentialStore;
use super::flow::ScanFlow;
use super::usage::UsageTracker;
use crate::models::config::AppConfig;
use crate::models::errors::{AppResult, ErrorCode};
use crate::providers::explorer::SourceRetrievalService;
use crate::providers::gemini::GeminiClient;
use crate::providers::llm::{LanguageModel, UnconfiguredModel};
use crate::providers::transport::{HttpTransport, ReqwestTransport};
use crate::utils::storage::{FileStore, KeyValueStore};

/// Persistent state: one substrate behind credentials and quota
#[derive(Clone)]
pub struct Services {
    pub credentials: CredentialStore,
    pub usage: UsageTracker,
}

impl Services {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            credentials: CredentialStore::new(store.clone()),
            usage: UsageTracker::new(store),
        }
    }

    /// Open the data file and seed explorer keys from the environment
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let store = FileStore::open(&config.data_file)?;
        let services = Self::new(Arc::new(store));

        let seeded = services
            .credentials
            .seed(&AppConfig::explorer_keys_from_env())?;
        if seeded > 0 {
            info!("🔑 {} explorer key(s) seeded from environment", seeded);
        }

        Ok(services)
    }

    /// Scan flow over explicit transport and model
    pub fn scan_flow_with(
        &self,
        transport: Arc<dyn HttpTransport>,
        model: Arc<dyn LanguageModel>,
        config: &AppConfig,
    ) -> ScanFlow {
        let retrieval = SourceRetrievalService::new(transport, self.credentials.clone())
            .with_timeout(config.explorer_timeout);
        ScanFlow::new(retrieval, AuditService::new(model), self.usage.clone())
    }

    /// Production scan flow. Without a Gemini key the flow still validates
    /// and fetches; analysis and chat fail with `CFG_MISSING_ENV`.
    pub fn scan_flow(&self, config: &AppConfig) -> AppResult<ScanFlow> {
        let model: Arc<dyn LanguageModel> = match GeminiClient::from_config(config) {
            Ok(model) => {
                info!(model = %model.model(), "🧠 Language model configured");
                Arc::new(model)
            }
            Err(e) if e.code == ErrorCode::ConfigMissingEnv => {
                warn!("⚠️ GEMINI_API_KEY not set, audits and chat are unavailable");
                Arc::new(UnconfiguredModel::new("GEMINI_API_KEY"))
            }
            Err(e) => return Err(e),
        };
        let transport = ReqwestTransport::new()?;
        Ok(self.scan_flow_with(Arc::new(transport), model, config))
    }
}
