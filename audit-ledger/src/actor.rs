//! Actor-based single writer for one chain
//!
//! Every request for a chain goes through one Tokio task, so appends are
//! applied strictly in mailbox order:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        API layer (many concurrent requests)          │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               ChainHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              ChainActor (Single Task)                │
//! │     append / finalize / prove / certificate          │
//! │                       │                              │
//! │                       ▼                              │
//! │                  LedgerChain                         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! All operations are CPU-bound and O(n) in the chain length, so they run
//! inline on the actor task.

use crate::{
    certificate::Certificate,
    ledger::{FinalizedRoot, LedgerChain},
    proof::AuthPath,
    types::{AppendRequest, EventRecord},
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the chain actor
#[derive(Debug)]
pub enum ChainMessage {
    /// Append a new event
    Append {
        request: AppendRequest,
        response: oneshot::Sender<Result<EventRecord>>,
    },

    /// Finalize and return the root
    Finalize {
        response: oneshot::Sender<FinalizedRoot>,
    },

    /// Generate an inclusion proof
    ProveInclusion {
        leaf_index: usize,
        response: oneshot::Sender<Result<AuthPath>>,
    },

    /// Issue a certificate
    Certificate {
        response: oneshot::Sender<Certificate>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns writes to one chain
#[derive(Debug)]
pub struct ChainActor {
    chain: Arc<LedgerChain>,
    mailbox: mpsc::Receiver<ChainMessage>,
}

impl ChainActor {
    /// Create new actor
    pub fn new(chain: Arc<LedgerChain>, mailbox: mpsc::Receiver<ChainMessage>) -> Self {
        Self { chain, mailbox }
    }

    /// Run the actor event loop until shutdown or all handles are dropped
    pub async fn run(mut self) {
        tracing::debug!(chain_id = %self.chain.chain_id(), "chain actor started");

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                ChainMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }

        tracing::debug!(chain_id = %self.chain.chain_id(), "chain actor stopped");
    }

    /// Handle a single message
    fn handle_message(&self, msg: ChainMessage) {
        match msg {
            ChainMessage::Append { request, response } => {
                let _ = response.send(self.chain.append(request));
            }

            ChainMessage::Finalize { response } => {
                let _ = response.send(self.chain.finalize());
            }

            ChainMessage::ProveInclusion {
                leaf_index,
                response,
            } => {
                let _ = response.send(self.chain.prove_inclusion(leaf_index));
            }

            ChainMessage::Certificate { response } => {
                let _ = response.send(self.chain.certificate());
            }

            ChainMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct ChainHandle {
    chain: Arc<LedgerChain>,
    sender: mpsc::Sender<ChainMessage>,
}

impl ChainHandle {
    /// Underlying chain, for lock-protected reads that skip the mailbox
    pub fn chain(&self) -> &Arc<LedgerChain> {
        &self.chain
    }

    /// Bound of the actor's mailbox
    pub fn mailbox_capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Append an event
    pub async fn append(&self, request: AppendRequest) -> Result<EventRecord> {
        let (tx, rx) = oneshot::channel();
        self.send(ChainMessage::Append {
            request,
            response: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// Finalize and return the root
    pub async fn finalize(&self) -> Result<FinalizedRoot> {
        let (tx, rx) = oneshot::channel();
        self.send(ChainMessage::Finalize { response: tx }).await?;
        Self::receive(rx).await
    }

    /// Generate an inclusion proof
    pub async fn prove_inclusion(&self, leaf_index: usize) -> Result<AuthPath> {
        let (tx, rx) = oneshot::channel();
        self.send(ChainMessage::ProveInclusion {
            leaf_index,
            response: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// Issue a certificate
    pub async fn certificate(&self) -> Result<Certificate> {
        let (tx, rx) = oneshot::channel();
        self.send(ChainMessage::Certificate { response: tx }).await?;
        Self::receive(rx).await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.send(ChainMessage::Shutdown).await
    }

    async fn send(&self, msg: ChainMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }

    async fn receive<T>(rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }
}

/// Spawn the actor for a chain
pub fn spawn_chain_actor(chain: Arc<LedgerChain>, mailbox_capacity: usize) -> ChainHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = ChainActor::new(Arc::clone(&chain), rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    ChainHandle { chain, sender: tx }
}
