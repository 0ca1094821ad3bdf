//! Audit Request Service
//!
//! Builds the structured-generation contract, calls the model once and
//! parses the answer strictly. A parse failure is an error, never a
//! default-valued audit.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{ContractInfo, SecurityAudit};
use crate::providers::llm::{ChatMessage, GenerationRequest, LanguageModel};
use crate::utils::constants::{APP_NAME, MAX_SOURCE_CHARS};

const AUDIT_SYSTEM_INSTRUCTION: &str = "You are a smart contract security auditor. Provide analysis in a structured JSON format. Ensure all strings in the JSON are properly escaped.";

/// Shown when the model answers a chat turn with no text
pub const CHAT_EMPTY_REPLY: &str = "Communication error.";
/// Shown when a chat turn fails for any reason
pub const CHAT_FAILURE_REPLY: &str = "Node failure. Reconnect.";
/// Context for chats opened without an audit
pub const GENERAL_CHAT_CONTEXT: &str = "General inquiry.";
/// Greeting shown before the first chat turn
pub const CHAT_GREETING: &str = "Security Analysis Node active. Ready for inquiry.";

fn finding_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "status": { "type": "BOOLEAN" },
            "explanation": { "type": "STRING" }
        },
        "required": ["status", "explanation"]
    })
}

/// Output schema the model must satisfy
pub fn audit_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "contractPurpose": { "type": "STRING", "description": "One sentence explaining what this does" },
            "keyFeatures": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "3-5 main functions"
            },
            "securityRisks": {
                "type": "OBJECT",
                "properties": {
                    "canDrainWallets": finding_schema(),
                    "adminPowers": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "List any owner/admin privileges"
                    },
                    "isPausable": finding_schema(),
                    "isUpgradeable": finding_schema(),
                    "hiddenFees": finding_schema()
                },
                "required": ["canDrainWallets", "adminPowers", "isPausable", "isUpgradeable", "hiddenFees"]
            },
            "riskLevel": { "type": "STRING", "enum": ["LOW", "MEDIUM", "HIGH"] },
            "verdict": { "type": "STRING", "description": "Final warning or green light message" }
        },
        "required": ["contractPurpose", "keyFeatures", "securityRisks", "riskLevel", "verdict"]
    })
}

/// First `max_chars` characters of `source`, on a char boundary
pub fn truncate_source(source: &str, max_chars: usize) -> &str {
    match source.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &source[..byte_idx],
        None => source,
    }
}

fn build_audit_prompt(contract_name: &str, source: &str) -> String {
    format!(
        r#"
You are a world-class blockchain security auditor for {app}. Analyze the provided code for "{name}".

IMPORTANT: This code could be Solidity (EVM) or Rust/Anchor (Solana).
- If it is Solana code, focus on: account validation, signer checks, PDA security, and arithmetic overflows.
- If it is Solidity, focus on: reentrancy, access control, logic flaws, and gas limits.

BE DIRECT. If it is dangerous, say so clearly.
Translate complex logic into plain English for a non-technical user.

CONTRACT CODE:
{source}
"#,
        app = APP_NAME,
        name = contract_name,
        source = source
    )
}

/// Context line seeded into a chat about a finished audit
pub fn audit_chat_context(contract: &ContractInfo, audit: &SecurityAudit) -> String {
    format!(
        "YOUTH CONTEXT: {} on {}. RISK: {}.",
        contract.name,
        contract.chain.name(),
        audit.risk_level.as_str()
    )
}

fn chat_system_instruction(context: Option<&str>) -> String {
    let mut instruction = format!(
        "You are an expert Web3 Security Assistant for {} Protocol. \
         Your goal is to help users understand smart contract security across multi-chain environments (Ethereum, L2s, Solana). ",
        APP_NAME
    );
    if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
        instruction.push_str(&format!(
            "The user is currently looking at an audit for a contract with this context: {} ",
            ctx
        ));
    }
    instruction.push_str(
        "Keep responses professional, educational, and easy for non-technical users to understand.",
    );
    instruction
}

#[derive(Clone)]
pub struct AuditService {
    model: Arc<dyn LanguageModel>,
    max_source_chars: usize,
}

impl AuditService {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            max_source_chars: MAX_SOURCE_CHARS,
        }
    }

    /// One structured audit of `source_code`. No retry.
    pub async fn analyze_contract(&self, name: &str, source_code: &str) -> AppResult<SecurityAudit> {
        let source = truncate_source(source_code, self.max_source_chars);
        if source.len() < source_code.len() {
            info!(
                contract = %name,
                kept_chars = self.max_source_chars,
                total_bytes = source_code.len(),
                "✂️ Source truncated for analysis"
            );
        }

        let request = GenerationRequest::prompt(build_audit_prompt(name, source))
            .system(AUDIT_SYSTEM_INSTRUCTION)
            .schema(audit_response_schema());

        info!(contract = %name, "🧠 Requesting security audit");
        let text = self.model.generate(request).await?;

        let audit: SecurityAudit = serde_json::from_str(text.trim()).map_err(|e| {
            warn!(contract = %name, error = %e, "Audit response did not match schema");
            AppError::with_source(
                ErrorCode::AnalysisParseError,
                "The security analysis returned an unreadable result. Please try again.",
                e,
            )
        })?;

        info!(contract = %name, risk = audit.risk_level.as_str(), "🧠 Audit complete");
        Ok(audit)
    }

    /// Open-ended follow-up conversation, optionally seeded with audit context
    pub fn create_chat(&self, context: Option<&str>) -> ChatSession {
        ChatSession {
            model: self.model.clone(),
            system_instruction: chat_system_instruction(context),
            history: Vec::new(),
        }
    }

    /// Chat seeded from a finished audit, or a general one
    pub fn create_audit_chat(&self, audit: Option<(&ContractInfo, &SecurityAudit)>) -> ChatSession {
        match audit {
            Some((contract, audit)) => self.create_chat(Some(&audit_chat_context(contract, audit))),
            None => self.create_chat(Some(GENERAL_CHAT_CONTEXT)),
        }
    }
}

/// Ongoing conversation. `send` takes `&mut self`, so one request is
/// outstanding at a time.
pub struct ChatSession {
    model: Arc<dyn LanguageModel>,
    system_instruction: String,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send a user turn. Blank input is ignored. Failures degrade to a
    /// fixed reply and leave history untouched.
    pub async fn send(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(text));

        let request = GenerationRequest {
            system_instruction: Some(self.system_instruction.clone()),
            messages,
            response_schema: None,
        };

        match self.model.generate(request).await {
            Ok(reply) => {
                let reply = if reply.trim().is_empty() {
                    CHAT_EMPTY_REPLY.to_string()
                } else {
                    reply
                };
                self.history.push(ChatMessage::user(text));
                self.history.push(ChatMessage::model(reply.clone()));
                Some(reply)
            }
            Err(e) => {
                warn!(kind = e.code_str(), "💬 Chat turn failed");
                Some(CHAT_FAILURE_REPLY.to_string())
            }
        }
    }
}
