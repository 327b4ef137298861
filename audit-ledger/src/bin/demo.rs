//! Ledger demo binary
//!
//! Records a few compliance events on one chain through its actor, finalizes
//! it and prints the finalize response, an inclusion proof, the certificate
//! and the audit trail as JSON.
//!
//! Usage: `audit-ledger-demo [config.toml]`

use anyhow::Context;
use audit_ledger::{
    attestation::{AttestationVerifier, RootMatchVerifier},
    config::LogFormat,
    proof, AppendRequest, ComplianceStatus, Config, LedgerRegistry, Metrics, RiskLevel,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => Config::from_env()?,
    };
    init_tracing(&config)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting audit ledger demo"
    );

    let metrics = Metrics::new()?;
    let registry = LedgerRegistry::new(config.ledger.clone()).with_metrics(metrics);
    let handle = registry.spawn_actor("apex-empire", &config.actor)?;

    let events = [
        ("gpt-4", "user: calculate risk", "risk: 0.23", ComplianceStatus::Pass, 12),
        ("claude-3", "user: approve loan", "decision: approved", ComplianceStatus::Pass, 12),
        ("gemini-pro", "user: diagnose", "diagnosis: flu", ComplianceStatus::Warning, 13),
    ];
    for (model_id, input, output, status, article) in events {
        let event = handle
            .append(
                AppendRequest::new(model_id, input, output, status)
                    .with_risk_level(RiskLevel::HighRisk)
                    .with_article(article),
            )
            .await?;
        tracing::info!(event_id = %event.event_id, status = %status, "recorded event");
    }

    let finalized = handle.finalize().await?;
    println!("{}", serde_json::to_string_pretty(&finalized)?);

    let inclusion = handle.prove_inclusion(0).await?;
    let verified = proof::verify(&inclusion.leaf_hash, &inclusion, &finalized.root);
    println!("{}", serde_json::to_string_pretty(&inclusion)?);
    tracing::info!(verified, "verified inclusion proof for event 0");

    let certificate = handle.certificate().await?;
    println!("{}", serde_json::to_string_pretty(&certificate)?);

    let chain = handle.chain();
    let attestation = RootMatchVerifier.attest(&certificate, chain.snapshot().leaf_hashes());
    tracing::info!(
        verifier = %attestation.verifier,
        verified = attestation.verified,
        "external attestation"
    );

    println!("{}", chain.export_audit_trail().to_json()?);

    handle.shutdown().await?;

    Ok(())
}
