//! Parallel proposal dispatch and endorsement aggregation.
//!
//! # Responsibilities
//! - Fan a signed proposal out to peers inside one task group
//! - Bound every peer call by the proposal timeout
//! - Join on all peers or on a minimum number of endorsements
//! - Keep the largest set of endorsements that agree on the payload
//!
//! # Design Decisions
//! - Dropping the group aborts every outstanding peer call
//! - Per-peer failures never surface individually; they become exclusions

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::network::PeerEndpoint;
use crate::observability::metrics;
use crate::transaction::proposal::SignedProposal;
use crate::transaction::transport::Endorser;
use crate::transaction::types::{CollectPolicy, EndorsementResponse, ExclusionReason, PeerExclusion};

/// What one peer produced.
#[derive(Debug, Clone)]
pub struct PeerOutcome {
    /// Position in the dispatch order.
    pub index: usize,
    pub peer: String,
    pub result: Result<EndorsementResponse, ExclusionReason>,
}

/// Send `proposal` to every peer concurrently and gather the outcomes.
///
/// Outcomes come back in dispatch order. Under
/// [`CollectPolicy::MinEndorsements`] peers still outstanding when the
/// threshold is reached are abandoned and do not appear.
pub async fn dispatch(
    endorser: &Arc<dyn Endorser>,
    peers: &[PeerEndpoint],
    proposal: &SignedProposal,
    per_peer_timeout: Duration,
    policy: CollectPolicy,
) -> Vec<PeerOutcome> {
    let started = Instant::now();
    let mut group = JoinSet::new();

    for (index, peer) in peers.iter().enumerate() {
        let call = endorser.process_proposal(peer, proposal);
        let name = peer.name.clone();
        group.spawn(async move {
            let result = match timeout(per_peer_timeout, call).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => Err(ExclusionReason::Transport(e.to_string())),
                Err(_) => Err(ExclusionReason::Timeout),
            };
            PeerOutcome {
                index,
                peer: name,
                result,
            }
        });
    }

    let mut outcomes = Vec::with_capacity(peers.len());
    let mut endorsed = 0usize;
    let mut drained = true;

    while let Some(joined) = group.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Endorsement task did not complete");
                continue;
            }
        };

        match &outcome.result {
            Ok(response) if response.is_success() => {
                endorsed += 1;
                metrics::record_endorsement("endorsed");
            }
            Ok(response) => {
                tracing::warn!(peer = %outcome.peer, status = response.status, message = %response.message, "Peer returned error status");
                metrics::record_endorsement("error_status");
            }
            Err(ExclusionReason::Timeout) => {
                tracing::warn!(peer = %outcome.peer, timeout_ms = per_peer_timeout.as_millis() as u64, "Peer timed out");
                metrics::record_endorsement("timeout");
            }
            Err(reason) => {
                tracing::warn!(peer = %outcome.peer, reason = %reason, "Peer call failed");
                metrics::record_endorsement("transport");
            }
        }
        outcomes.push(outcome);

        if let CollectPolicy::MinEndorsements(min) = policy {
            if endorsed >= min && !group.is_empty() {
                tracing::debug!(endorsed, abandoned = group.len(), "Endorsement threshold reached");
                drained = false;
                group.abort_all();
                break;
            }
        }
    }

    // Tasks that died without reporting (panicked transport) are still peers
    // we contacted.
    if drained && outcomes.len() < peers.len() {
        for (index, peer) in peers.iter().enumerate() {
            if !outcomes.iter().any(|o| o.index == index) {
                outcomes.push(PeerOutcome {
                    index,
                    peer: peer.name.clone(),
                    result: Err(ExclusionReason::Transport("endorsement task aborted".to_string())),
                });
            }
        }
    }

    metrics::record_endorsement_round(started.elapsed());
    outcomes.sort_by_key(|o| o.index);
    outcomes
}

/// Split outcomes into successful endorsements and exclusions.
pub fn partition(outcomes: Vec<PeerOutcome>) -> (Vec<EndorsementResponse>, Vec<PeerExclusion>) {
    let mut endorsements = Vec::new();
    let mut excluded = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(response) if response.is_success() => endorsements.push(response),
            Ok(response) => excluded.push(PeerExclusion {
                peer: outcome.peer,
                reason: ExclusionReason::ErrorStatus {
                    status: response.status,
                    message: response.message,
                },
            }),
            Err(reason) => excluded.push(PeerExclusion {
                peer: outcome.peer,
                reason,
            }),
        }
    }

    (endorsements, excluded)
}

/// Keep the largest group of endorsements sharing one payload.
///
/// Ties go to the group whose first member was dispatched earliest. The
/// others are returned as `Inconsistent` exclusions.
pub fn select_consistent(
    endorsements: Vec<EndorsementResponse>,
) -> (Vec<EndorsementResponse>, Vec<PeerExclusion>) {
    // (payload, members) in first-seen order
    let mut groups: Vec<(Vec<u8>, Vec<EndorsementResponse>)> = Vec::new();
    for response in endorsements {
        match groups.iter_mut().find(|(payload, _)| *payload == response.payload) {
            Some((_, members)) => members.push(response),
            None => groups.push((response.payload.clone(), vec![response])),
        }
    }

    let best = groups
        .iter()
        .enumerate()
        .max_by(|(ia, (_, a)), (ib, (_, b))| a.len().cmp(&b.len()).then(ib.cmp(ia)))
        .map(|(i, _)| i);

    let mut kept = Vec::new();
    let mut excluded = Vec::new();
    for (i, (_, members)) in groups.into_iter().enumerate() {
        if Some(i) == best {
            kept = members;
        } else {
            for response in members {
                tracing::warn!(peer = %response.peer, "Endorsement payload disagrees with majority");
                metrics::record_endorsement("inconsistent");
                excluded.push(PeerExclusion {
                    peer: response.peer,
                    reason: ExclusionReason::Inconsistent,
                });
            }
        }
    }

    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(peer: &str, status: i32, payload: &[u8]) -> EndorsementResponse {
        EndorsementResponse {
            peer: peer.into(),
            status,
            message: if status >= 400 { "chaincode error".into() } else { String::new() },
            payload: payload.to_vec(),
            endorser: Vec::new(),
            signature: Vec::new(),
        }
    }

    #[test]
    fn test_partition() {
        let outcomes = vec![
            PeerOutcome { index: 0, peer: "a".into(), result: Ok(response("a", 200, b"x")) },
            PeerOutcome { index: 1, peer: "b".into(), result: Ok(response("b", 500, b"")) },
            PeerOutcome { index: 2, peer: "c".into(), result: Err(ExclusionReason::Timeout) },
        ];
        let (endorsements, excluded) = partition(outcomes);
        assert_eq!(endorsements.len(), 1);
        assert_eq!(endorsements[0].peer, "a");
        assert_eq!(excluded.len(), 2);
        assert!(matches!(excluded[0].reason, ExclusionReason::ErrorStatus { status: 500, .. }));
        assert_eq!(excluded[1].reason, ExclusionReason::Timeout);
    }

    #[test]
    fn test_select_consistent_majority() {
        let (kept, excluded) = select_consistent(vec![
            response("a", 200, b"x"),
            response("b", 200, b"y"),
            response("c", 200, b"y"),
        ]);
        let kept: Vec<_> = kept.iter().map(|r| r.peer.as_str()).collect();
        assert_eq!(kept, vec!["b", "c"]);
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].peer, "a");
        assert_eq!(excluded[0].reason, ExclusionReason::Inconsistent);
    }

    #[test]
    fn test_select_consistent_tie_prefers_earliest() {
        let (kept, excluded) = select_consistent(vec![response("a", 200, b"x"), response("b", 200, b"y")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].peer, "a");
        assert_eq!(excluded[0].peer, "b");
    }

    #[test]
    fn test_select_consistent_empty() {
        let (kept, excluded) = select_consistent(Vec::new());
        assert!(kept.is_empty());
        assert!(excluded.is_empty());
    }
}
