//! End-to-end scan flow tests over mock explorer and mock model

mod common;

use common::*;
use youth_audit::{
    ChainId, ErrorCode, FlowState, HttpResponse, RiskLevel, ScanOutcome, TransportError,
};

#[tokio::test]
async fn test_high_risk_scan_completes_and_counts_once() {
    let transport = MockTransport::ok(VERIFIED_EVM);
    let model = MockModel::replying(audit_json("HIGH"));
    let h = harness(transport.clone(), model.clone());
    h.credentials.set(ChainId::Ethereum, "ETHKEY").unwrap();

    let before = h.usage.get_stats().unwrap().scans_used_today;
    let report = h.flow.run(USDT, ChainId::Ethereum).await;

    assert_eq!(report.final_state, FlowState::Done);
    match &report.outcome {
        ScanOutcome::Completed { contract, audit } => {
            assert_eq!(contract.name, "TetherToken");
            assert_eq!(contract.chain, ChainId::Ethereum);
            assert_eq!(audit.risk_level, RiskLevel::High);
        }
        other => panic!("expected completion, got {:?}", other),
    }
    assert_eq!(h.usage.get_stats().unwrap().scans_used_today, before + 1);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(model.call_count(), 1);

    let sent = transport.requests.lock().unwrap()[0].clone();
    assert_eq!(sent.query_value("apikey"), Some("ETHKEY"));
    assert_eq!(sent.query_value("address"), Some(USDT));
}

#[tokio::test]
async fn test_missing_key_halts_at_fetching() {
    let transport = MockTransport::ok(VERIFIED_EVM);
    let model = MockModel::replying(audit_json("LOW"));
    let h = harness(transport.clone(), model.clone());

    let report = h.flow.run(USDT, ChainId::Polygon).await;

    assert_eq!(report.final_state, FlowState::Error);
    assert_eq!(report.trail[report.trail.len() - 2], FlowState::Fetching);
    match &report.outcome {
        ScanOutcome::Failed {
            kind,
            message,
            prompt_credentials,
            retryable,
        } => {
            assert_eq!(*kind, ErrorCode::MissingApiKey);
            assert!(*prompt_credentials);
            assert!(!retryable);
            assert!(message.contains("Polygon"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(h.usage.get_stats().unwrap().scans_used_today, 0);
    assert_eq!(transport.call_count(), 0);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_exhausted_quota_offers_upgrade_without_network() {
    let transport = MockTransport::ok(VERIFIED_EVM);
    let h = harness(transport.clone(), MockModel::replying(audit_json("LOW")));
    h.credentials.set(ChainId::Ethereum, "k").unwrap();

    for _ in 0..5 {
        assert!(h.flow.run(USDT, ChainId::Ethereum).await.is_completed());
    }
    assert_eq!(transport.call_count(), 5);

    let report = h.flow.run(USDT, ChainId::Ethereum).await;
    match &report.outcome {
        ScanOutcome::UpgradeRequired { stats } => assert_eq!(stats.scans_used_today, 5),
        other => panic!("expected upgrade prompt, got {:?}", other),
    }
    assert_eq!(transport.call_count(), 5);

    h.flow.upgrade().unwrap();
    let report = h.flow.run(USDT, ChainId::Ethereum).await;
    assert!(report.is_completed());
    assert_eq!(h.usage.get_stats().unwrap().scans_used_today, 5);
}

#[tokio::test]
async fn test_invalid_addresses_fail_closed() {
    let transport = MockTransport::ok(VERIFIED_EVM);
    let h = harness(transport.clone(), MockModel::replying(audit_json("LOW")));
    h.credentials.set(ChainId::Solana, "k").unwrap();
    h.credentials.set(ChainId::Bsc, "k").unwrap();

    let report = h.flow.run(USDT, ChainId::Solana).await;
    match &report.outcome {
        ScanOutcome::InvalidAddress { message } => assert_eq!(message, "INVALID SOL ADDRESS FORMAT"),
        other => panic!("expected invalid address, got {:?}", other),
    }

    let report = h.flow.run(SPL_TOKEN, ChainId::Bsc).await;
    assert!(matches!(report.outcome, ScanOutcome::InvalidAddress { .. }));

    assert_eq!(transport.call_count(), 0);
    assert_eq!(h.usage.get_stats().unwrap().scans_used_today, 0);
}

#[tokio::test]
async fn test_unparseable_audit_is_an_error_and_free() {
    let h = harness(
        MockTransport::ok(VERIFIED_EVM),
        MockModel::replying("I think this contract is fine."),
    );
    h.credentials.set(ChainId::Ethereum, "k").unwrap();

    let report = h.flow.run(USDT, ChainId::Ethereum).await;
    match &report.outcome {
        ScanOutcome::Failed { kind, .. } => assert_eq!(*kind, ErrorCode::AnalysisParseError),
        other => panic!("expected parse failure, got {:?}", other),
    }
    assert_eq!(h.usage.get_stats().unwrap().scans_used_today, 0);
}

#[tokio::test]
async fn test_model_outage_surfaces_analysis_failure() {
    let h = harness(MockTransport::ok(VERIFIED_EVM), MockModel::failing("503 overloaded"));
    h.credentials.set(ChainId::Ethereum, "k").unwrap();

    let report = h.flow.run(USDT, ChainId::Ethereum).await;
    match &report.outcome {
        ScanOutcome::Failed { kind, prompt_credentials, retryable, .. } => {
            assert_eq!(*kind, ErrorCode::AnalysisFailed);
            assert!(!prompt_credentials);
            assert!(*retryable);
        }
        other => panic!("expected analysis failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_solana_program_scan() {
    let body = r#"{"success":true,"data":{"programName":"spl_token","source":"pub fn process_instruction() {}"}}"#;
    let transport = MockTransport::ok(body);
    let h = harness(transport.clone(), MockModel::replying(audit_json("LOW")));
    h.credentials.set(ChainId::Solana, "SOLKEY").unwrap();

    let report = h.flow.run(SPL_TOKEN, ChainId::Solana).await;
    assert!(report.is_completed());

    let sent = transport.requests.lock().unwrap()[0].clone();
    assert_eq!(sent.header_value("token"), Some("SOLKEY"));
    assert_eq!(sent.query_value("apikey"), None);
}

#[tokio::test]
async fn test_rejected_key_prompts_credentials() {
    let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
    let h = harness(MockTransport::ok(body), MockModel::replying(audit_json("LOW")));
    h.credentials.set(ChainId::Base, "bad").unwrap();

    let report = h.flow.run(USDT, ChainId::Base).await;
    match &report.outcome {
        ScanOutcome::Failed { kind, prompt_credentials, .. } => {
            assert_eq!(*kind, ErrorCode::InvalidApiKey);
            assert!(*prompt_credentials);
        }
        other => panic!("expected invalid key, got {:?}", other),
    }
}

#[tokio::test]
async fn test_throttled_explorer_is_rate_limit() {
    let h = harness(
        MockTransport::replying(Ok(HttpResponse::new(429, "Too Many Requests"))),
        MockModel::replying(audit_json("LOW")),
    );
    h.credentials.set(ChainId::Avalanche, "k").unwrap();

    let report = h.flow.run(USDT, ChainId::Avalanche).await;
    match &report.outcome {
        ScanOutcome::Failed { kind, retryable, .. } => {
            assert_eq!(*kind, ErrorCode::RateLimit);
            assert!(*retryable);
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_timeout_is_network_timeout() {
    let h = harness(
        MockTransport::replying(Err(TransportError::Timeout)),
        MockModel::replying(audit_json("LOW")),
    );
    h.credentials.set(ChainId::Optimism, "k").unwrap();

    let report = h.flow.run(USDT, ChainId::Optimism).await;
    match &report.outcome {
        ScanOutcome::Failed { kind, message, .. } => {
            assert_eq!(*kind, ErrorCode::NetworkTimeout);
            assert!(message.contains("Optimism"));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}
