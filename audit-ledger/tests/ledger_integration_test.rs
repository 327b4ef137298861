//! End-to-end tests over the public ledger API

use audit_ledger::{
    actor::spawn_chain_actor,
    merkle::empty_root,
    proof, AppendRequest, CertificateStatus, ComplianceStatus, Error, ErrorKind, LedgerChain,
    LedgerConfig, LedgerRegistry, RiskLevel,
};
use std::sync::Arc;
use std::thread;

fn request(model_id: &str, status: ComplianceStatus) -> AppendRequest {
    AppendRequest::new(model_id, "user: approve loan", "decision: approved", status)
        .with_risk_level(RiskLevel::HighRisk)
}

#[test]
fn test_certificate_law() {
    let chain = LedgerChain::new("certificate-law", LedgerConfig::default()).unwrap();

    chain.append(request("gpt-4", ComplianceStatus::Pass)).unwrap();
    chain.append(request("claude-3", ComplianceStatus::Pass)).unwrap();
    chain.append(request("gemini-pro", ComplianceStatus::Warning)).unwrap();
    let cert = chain.certificate();
    assert!((cert.compliance_score - 66.67).abs() < 1e-9);
    assert_eq!(cert.status, CertificateStatus::ReviewRequired);

    chain.append(request("gpt-4", ComplianceStatus::Pass)).unwrap();
    let cert = chain.certificate();
    assert_eq!(cert.compliance_score, 75.0);
    assert_eq!(cert.status, CertificateStatus::ReviewRequired);

    chain.append(request("gpt-4", ComplianceStatus::Pass)).unwrap();
    let cert = chain.certificate();
    assert_eq!(cert.compliance_score, 80.0);
    assert_eq!(cert.status, CertificateStatus::Compliant);
    assert_eq!(cert.total_events, 5);
}

#[test]
fn test_empty_ledger() {
    let chain = LedgerChain::new("empty", LedgerConfig::default()).unwrap();
    let finalized = chain.finalize();
    assert_eq!(finalized.root, empty_root());
    assert_eq!(finalized.event_count, 0);
    assert_eq!(chain.compliance_score(), 0.0);

    let cert = chain.certificate();
    assert_eq!(cert.total_events, 0);
    assert_eq!(cert.compliance_score, 0.0);
    assert!(cert.articles_covered.is_empty());
    assert_eq!(cert.status, CertificateStatus::ReviewRequired);

    let err = chain.prove_inclusion(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn test_custom_threshold() {
    let config = LedgerConfig {
        compliant_threshold: 60.0,
        ..LedgerConfig::default()
    };
    let chain = LedgerChain::new("lenient", config).unwrap();
    chain.append(request("m", ComplianceStatus::Pass)).unwrap();
    chain.append(request("m", ComplianceStatus::Pass)).unwrap();
    chain.append(request("m", ComplianceStatus::Fail)).unwrap();
    assert_eq!(chain.certificate().status, CertificateStatus::Compliant);
}

#[test]
fn test_proof_json_roundtrip_verifies() {
    let chain = LedgerChain::new("wire", LedgerConfig::default()).unwrap();
    for status in [
        ComplianceStatus::Pass,
        ComplianceStatus::Fail,
        ComplianceStatus::Pending,
        ComplianceStatus::Warning,
        ComplianceStatus::Pass,
    ] {
        chain.append(request("gpt-4", status)).unwrap();
    }
    let finalized = chain.finalize();
    let finalized_json = serde_json::to_value(&finalized).unwrap();
    assert_eq!(finalized_json["event_count"], 5);
    let root_hex = finalized_json["root"].as_str().unwrap().to_string();
    assert_eq!(root_hex.len(), 64);

    let wire = serde_json::to_string(&chain.prove_inclusion(4).unwrap()).unwrap();
    let received: audit_ledger::AuthPath = serde_json::from_str(&wire).unwrap();
    let leaf_hex = hex::encode(received.leaf_hash);
    assert!(proof::verify_hex(&leaf_hex, &received, &root_hex));
}

#[test]
fn test_concurrent_appends_from_threads() {
    let chain = Arc::new(LedgerChain::new("threads", LedgerConfig::default()).unwrap());

    let writers: Vec<_> = (0..8)
        .map(|t| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                for i in 0..25 {
                    chain
                        .append(request(&format!("model-{}-{}", t, i), ComplianceStatus::Pass))
                        .unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let chain = Arc::clone(&chain);
        thread::spawn(move || {
            for _ in 0..50 {
                let snapshot = chain.snapshot();
                // events and tree always come from the same state
                assert_eq!(snapshot.events().len(), snapshot.event_count());
                if let Some(last) = snapshot.event_count().checked_sub(1) {
                    let path = proof::prove_inclusion(&snapshot, last).unwrap();
                    assert!(proof::verify(&path.leaf_hash, &path, &snapshot.root()));
                }
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(chain.len(), 200);
    let root = chain.root();
    for i in (0..200).step_by(17) {
        let path = chain.prove_inclusion(i).unwrap();
        assert!(proof::verify(&path.leaf_hash, &path, &root));
    }
}

#[test]
fn test_registry_creates_on_first_reference() {
    let registry = LedgerRegistry::default();
    registry
        .get_or_create("provider-a")
        .unwrap()
        .append(request("gpt-4", ComplianceStatus::Pass))
        .unwrap();

    let chain = registry.get("provider-a").unwrap();
    assert_eq!(chain.len(), 1);
    assert!(matches!(
        registry.get("provider-b"),
        Err(Error::ChainNotFound(_))
    ));
}

#[tokio::test]
async fn test_actor_front_end_over_registry_chain() {
    let registry = LedgerRegistry::default();
    let handle = spawn_chain_actor(registry.get_or_create("provider-a").unwrap(), 8);

    for status in [ComplianceStatus::Pass, ComplianceStatus::Warning] {
        handle.append(request("gpt-4", status)).await.unwrap();
    }
    let finalized = handle.finalize().await.unwrap();
    assert_eq!(registry.get("provider-a").unwrap().root(), finalized.root);

    let stale = handle.prove_inclusion(1).await.unwrap();
    handle
        .append(request("gpt-4", ComplianceStatus::Pass))
        .await
        .unwrap();
    let chain = registry.get("provider-a").unwrap();
    assert_eq!(
        chain.check_proof_freshness(&stale).unwrap_err().kind(),
        ErrorKind::StaleSnapshot
    );
    assert!(chain.verify_inclusion(&stale).unwrap());

    handle.shutdown().await.unwrap();
}
