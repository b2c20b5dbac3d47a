//! Commit observation for submitted transactions.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::select_ok;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::network::PeerEndpoint;
use crate::observability::metrics;
use crate::transaction::transport::CommitListener;
use crate::transaction::types::{CommitEvent, PeerExclusion, SubmittedTransaction, TxError, TxResult};

/// Spawned commit listener. Aborted when dropped, so a caller that gives up
/// at any point leaves no task behind.
#[derive(Debug)]
pub(crate) struct ListenerTask(JoinHandle<TxResult<CommitEvent>>);

impl Drop for ListenerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Start listening for `tx_id` on every peer in `peers`.
///
/// The first peer to report wins. Listening starts before the envelope is
/// broadcast so a fast commit cannot be missed.
pub(crate) fn spawn_listener(
    commits: Arc<dyn CommitListener>,
    peers: Vec<PeerEndpoint>,
    tx_id: String,
) -> ListenerTask {
    ListenerTask(tokio::spawn(async move {
        if peers.is_empty() {
            return Err(TxError::CommitUnobservable {
                tx_id,
                reason: "no peer to listen on".to_string(),
            });
        }

        let waits: Vec<_> = peers
            .iter()
            .map(|peer| commits.wait_for_commit(peer, &tx_id))
            .collect();

        match select_ok(waits).await {
            Ok((event, _)) => Ok(event),
            Err(e) => Err(TxError::CommitUnobservable {
                tx_id,
                reason: e.to_string(),
            }),
        }
    }))
}

/// Handle to a transaction accepted by the ordering service.
///
/// Dropping the handle stops listening for the commit event.
#[derive(Debug)]
pub struct CommitHandle {
    transaction: SubmittedTransaction,
    listener: ListenerTask,
    commit_timeout: Duration,
}

impl CommitHandle {
    pub(crate) fn new(
        transaction: SubmittedTransaction,
        listener: ListenerTask,
        commit_timeout: Duration,
    ) -> Self {
        Self {
            transaction,
            listener,
            commit_timeout,
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.transaction.tx_id
    }

    pub fn transaction(&self) -> &SubmittedTransaction {
        &self.transaction
    }

    /// Peers that were contacted but did not endorse.
    pub fn excluded(&self) -> &[PeerExclusion] {
        &self.transaction.excluded
    }

    /// Wait for the commit event.
    ///
    /// A `CommitTimeout` says nothing about the transaction's fate; it may
    /// still commit later.
    pub async fn wait(self) -> TxResult<CommitEvent> {
        let Self {
            transaction,
            mut listener,
            commit_timeout,
        } = self;
        let tx_id = transaction.tx_id;

        let result = match timeout(commit_timeout, &mut listener.0).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(TxError::CommitUnobservable {
                tx_id: tx_id.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(TxError::CommitTimeout {
                tx_id: tx_id.clone(),
                waited: commit_timeout,
            }),
        };

        match &result {
            Ok(event) if event.is_valid() => {
                tracing::info!(tx_id = %tx_id, block = event.block_number, peer = %event.peer, "Transaction committed");
                metrics::record_commit("valid");
            }
            Ok(event) => {
                tracing::warn!(tx_id = %tx_id, validation_code = event.validation_code, "Transaction committed as invalid");
                metrics::record_commit("invalid");
            }
            Err(TxError::CommitTimeout { .. }) => {
                tracing::warn!(tx_id = %tx_id, timeout_secs = commit_timeout.as_secs(), "Commit wait timed out");
                metrics::record_commit("timeout");
            }
            Err(e) => {
                tracing::warn!(tx_id = %tx_id, error = %e, "Commit unobservable");
                metrics::record_commit("unobservable");
            }
        }

        result
    }
}
