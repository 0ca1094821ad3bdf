//! Type definitions for Youth Audit
//! Retrieval results, audit results and the persisted usage record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::config::ChainId;

/// Overall risk classification returned by the auditor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
        }
    }
}

/// Verified contract source. Only built for verified contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub address: String,
    pub name: String,
    pub source_code: String,
    pub is_verified: bool,
    pub chain: ChainId,
}

impl ContractInfo {
    pub fn verified(
        address: impl Into<String>,
        name: impl Into<String>,
        source_code: impl Into<String>,
        chain: ChainId,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            source_code: source_code.into(),
            is_verified: true,
            chain,
        }
    }
}

/// A yes/no risk with its justification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub status: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRisks {
    pub can_drain_wallets: RiskFinding,
    pub admin_powers: Vec<String>,
    pub is_pausable: RiskFinding,
    pub is_upgradeable: RiskFinding,
    pub hidden_fees: RiskFinding,
}

impl SecurityRisks {
    /// Labelled findings, in report order
    pub fn findings(&self) -> [(&'static str, &RiskFinding); 4] {
        [
            ("Can drain wallets", &self.can_drain_wallets),
            ("Pausable", &self.is_pausable),
            ("Upgradeable", &self.is_upgradeable),
            ("Hidden fees", &self.hidden_fees),
        ]
    }
}

/// Structured audit produced by the model. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAudit {
    pub contract_purpose: String,
    /// 3-5 items expected, not enforced
    pub key_features: Vec<String>,
    pub security_risks: SecurityRisks,
    pub risk_level: RiskLevel,
    pub verdict: String,
}

impl SecurityAudit {
    /// Plain-text report for terminals
    pub fn summary(&self, contract: &ContractInfo) -> String {
        let descriptor = contract.chain.descriptor();
        let mut output = format!(
            "\n{} Risk: {} | {} on {}\n",
            self.risk_level.emoji(),
            self.risk_level.as_str(),
            contract.name,
            descriptor.name
        );
        output.push_str(&format!("   Address: {}\n", contract.address));
        output.push_str(&format!(
            "   Explorer: {}\n",
            descriptor.explorer_address_url(&contract.address)
        ));
        output.push_str(&format!("   Purpose: {}\n", self.contract_purpose));

        if !self.key_features.is_empty() {
            output.push_str("   Key features:\n");
            for feature in &self.key_features {
                output.push_str(&format!("     - {}\n", feature));
            }
        }

        output.push_str("   Risks:\n");
        for (label, finding) in self.security_risks.findings() {
            output.push_str(&format!(
                "     {} {}: {}\n",
                if finding.status { "⚠️" } else { "✅" },
                label,
                finding.explanation
            ));
        }

        if !self.security_risks.admin_powers.is_empty() {
            output.push_str("   Admin powers:\n");
            for power in &self.security_risks.admin_powers {
                output.push_str(&format!("     - {}\n", power));
            }
        }

        output.push_str(&format!("   Verdict: {}\n", self.verdict));
        output
    }
}

/// Persisted daily usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub scans_used_today: u32,
    pub last_reset_date: NaiveDate,
    pub is_pro: bool,
}

impl UsageRecord {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            scans_used_today: 0,
            last_reset_date: today,
            is_pro: false,
        }
    }
}
