//! Owned store of chains keyed by `chain_id`
//!
//! Chains are created on first reference and never evicted here; retention
//! is left to whoever owns the registry. Chains share no mutable state, so
//! lookups only contend on the map shard, never on another chain's lock.

use crate::{
    actor::{spawn_chain_actor, ChainHandle},
    config::{ActorConfig, LedgerConfig},
    ledger::LedgerChain,
    metrics::Metrics,
    Error, Result,
};
use dashmap::DashMap;
use std::sync::Arc;

/// Registry of ledger chains
#[derive(Debug)]
pub struct LedgerRegistry {
    chains: DashMap<String, Arc<LedgerChain>>,
    config: LedgerConfig,
    metrics: Option<Metrics>,
}

impl LedgerRegistry {
    /// Create an empty registry
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            chains: DashMap::new(),
            config,
            metrics: None,
        }
    }

    /// Attach a metrics collector shared by every chain created from now on
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get the chain for `chain_id`, creating it on first reference
    pub fn get_or_create(&self, chain_id: &str) -> Result<Arc<LedgerChain>> {
        if let Some(chain) = self.chains.get(chain_id) {
            return Ok(Arc::clone(chain.value()));
        }

        let mut chain = LedgerChain::new(chain_id, self.config.clone())?;
        if let Some(metrics) = &self.metrics {
            chain = chain.with_metrics(metrics.clone());
        }

        let chain = Arc::clone(
            self.chains
                .entry(chain_id.to_string())
                .or_insert_with(|| {
                    tracing::info!(chain_id, "created chain");
                    Arc::new(chain)
                })
                .value(),
        );

        if let Some(metrics) = &self.metrics {
            metrics.set_chains(self.chains.len());
        }
        Ok(chain)
    }

    /// Get an existing chain
    pub fn get(&self, chain_id: &str) -> Result<Arc<LedgerChain>> {
        self.chains
            .get(chain_id)
            .map(|chain| Arc::clone(chain.value()))
            .ok_or_else(|| Error::ChainNotFound(chain_id.to_string()))
    }

    /// Spawn a single-writer actor in front of the chain for `chain_id`
    ///
    /// Creates the chain on first reference. Must be called from within a
    /// tokio runtime.
    pub fn spawn_actor(&self, chain_id: &str, config: &ActorConfig) -> Result<ChainHandle> {
        let chain = self.get_or_create(chain_id)?;
        tracing::debug!(
            chain_id,
            mailbox_capacity = config.mailbox_capacity,
            "spawning chain actor"
        );
        Ok(spawn_chain_actor(chain, config.mailbox_capacity))
    }

    /// Check whether a chain exists
    pub fn contains(&self, chain_id: &str) -> bool {
        self.chains.contains_key(chain_id)
    }

    /// Number of chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Chain identifiers, sorted
    pub fn chain_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.chains.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl Default for LedgerRegistry {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
