use crate::commitlog::Index;
use crate::grpc::{
    proto_commit_record_result, proto_propose_entry_error, proto_propose_entry_result, proto_truncate_from_error,
    proto_truncate_from_result, ProtoCommitRecordReq, ProtoProposeEntryReq, ProtoProposeEntryResult,
    ProtoTruncateFromReq,
};
use crate::replica::log_entry::{LogEntry, Term};
use crate::replica::order_record::OrderRecord;
use crate::replica::peer_client::PeerError;
use crate::replica::peers::{get_majority_count, NodeId, Peer};

/// The outcome of sending one proposal to every peer.
#[derive(Debug, Default)]
pub(super) struct ProposalRound {
    pub(super) acked: Vec<NodeId>,
    pub(super) excluded: Vec<NodeId>,
    // Highest term a peer reported when rejecting us as stale.
    pub(super) newer_term: Option<Term>,
    // A peer holds a different committed entry at the proposed index, so our log is behind.
    pub(super) log_conflict: bool,
}

impl ProposalRound {
    /// Acks including the leader's own.
    pub(super) fn num_acks(&self) -> usize {
        self.acked.len() + 1
    }
}

#[derive(Debug)]
enum ProposeReply {
    Ack,
    StaleTerm(Term),
    LogConflict(u64),
    Rejected(String),
}

/// Returns true if `num_acks` (leader included) is a strict majority of `num_members`.
pub(super) fn has_quorum(num_acks: usize, num_members: usize) -> bool {
    num_acks >= get_majority_count(num_members)
}

/// Sends `entry` to every peer in parallel and waits for each to answer or time out. No retries
/// within a round; a peer that fails is simply excluded from this round's ack count.
pub(super) async fn propose_to_peers<'a>(
    logger: &slog::Logger,
    peers: impl Iterator<Item = &'a Peer>,
    leader_id: NodeId,
    entry: &LogEntry,
) -> ProposalRound {
    let mut in_flight = Vec::new();
    for peer in peers {
        let peer = peer.clone();
        let rpc_request = ProtoProposeEntryReq {
            leader_id: leader_id.as_u64(),
            entry: Some(entry.clone().into()),
        };
        in_flight.push((
            peer.node_id(),
            tokio::task::spawn(async move { peer.client.propose_entry(rpc_request).await }),
        ));
    }

    let mut round = ProposalRound::default();
    for (peer_id, handle) in in_flight {
        let peer_logger = logger.new(slog::o!("Peer" => format!("{:?}", peer_id)));
        let reply = match handle.await {
            Ok(rpc_reply) => convert_propose_entry_reply(rpc_reply),
            Err(join_error) => Err(format!("Proposal task failed: {:?}", join_error)),
        };

        match reply {
            Ok(ProposeReply::Ack) => round.acked.push(peer_id),
            Ok(ProposeReply::StaleTerm(term)) => {
                slog::warn!(peer_logger, "Peer rejected proposal, it's already on term {:?}", term);
                round.newer_term = round.newer_term.max(Some(term));
                round.excluded.push(peer_id);
            }
            Ok(ProposeReply::LogConflict(index)) => {
                slog::warn!(peer_logger, "Peer has a different committed entry at {}", index);
                round.log_conflict = true;
                round.excluded.push(peer_id);
            }
            Ok(ProposeReply::Rejected(reason)) => {
                slog::warn!(peer_logger, "Peer rejected proposal: {}", reason);
                round.excluded.push(peer_id);
            }
            Err(reason) => {
                slog::warn!(peer_logger, "Peer unreachable, excluding it from this round: {}", reason);
                round.excluded.push(peer_id);
            }
        }
    }

    round
}

fn convert_propose_entry_reply(
    rpc_reply: Result<ProtoProposeEntryResult, PeerError>,
) -> Result<ProposeReply, String> {
    match rpc_reply {
        Ok(rpc_result) => match rpc_result.result {
            Some(proto_propose_entry_result::Result::Ok(_)) => Ok(ProposeReply::Ack),
            Some(proto_propose_entry_result::Result::Err(err)) => match err.err {
                Some(proto_propose_entry_error::Err::StaleTerm(payload)) => {
                    Ok(ProposeReply::StaleTerm(Term::new(payload.current_term)))
                }
                Some(proto_propose_entry_error::Err::LogConflict(payload)) => {
                    Ok(ProposeReply::LogConflict(payload.index))
                }
                Some(proto_propose_entry_error::Err::CatchUpFailed(payload)) => Ok(ProposeReply::Rejected(
                    format!("Catch-up failed: {}", payload.message),
                )),
                Some(proto_propose_entry_error::Err::ServerFault(payload)) => Ok(ProposeReply::Rejected(
                    format!("Explicit server fault: {}", payload.message),
                )),
                None => Err("Malformed ProposeEntry Err".into()),
            },
            None => Err("Malformed ProposeEntry Result".into()),
        },
        Err(e) => Err(e.to_string()),
    }
}

/// Removes a speculative entry from every peer that accepted it. Best effort: a peer we can't
/// reach keeps the entry until a later round or catch-up replaces it.
pub(super) async fn roll_back<'a>(
    logger: &slog::Logger,
    peers: impl Iterator<Item = &'a Peer>,
    leader_id: NodeId,
    index: Index,
) {
    let mut in_flight = Vec::new();
    for peer in peers {
        let peer = peer.clone();
        let rpc_request = ProtoTruncateFromReq {
            leader_id: leader_id.as_u64(),
            index: index.as_u64(),
        };
        in_flight.push((
            peer.node_id(),
            tokio::task::spawn(async move { peer.client.truncate_from(rpc_request).await }),
        ));
    }

    for (peer_id, handle) in in_flight {
        let outcome = match handle.await {
            Ok(Ok(rpc_result)) => match rpc_result.result {
                Some(proto_truncate_from_result::Result::Ok(_)) => Ok(()),
                Some(proto_truncate_from_result::Result::Err(err)) => match err.err {
                    Some(proto_truncate_from_error::Err::CommittedEntry(payload)) => Err(format!(
                        "Peer refused, its commit index is {}",
                        payload.commit_index
                    )),
                    Some(proto_truncate_from_error::Err::ServerFault(payload)) => {
                        Err(format!("Explicit server fault: {}", payload.message))
                    }
                    None => Err("Malformed TruncateFrom Err".to_string()),
                },
                None => Err("Malformed TruncateFrom Result".to_string()),
            },
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) => Err(format!("Rollback task failed: {:?}", join_error)),
        };

        match outcome {
            Ok(()) => slog::info!(logger, "Rolled back {:?} from {:?}", index, peer_id),
            Err(reason) => slog::warn!(logger, "Failed to roll back {:?} from {:?}: {}", index, peer_id, reason),
        }
    }
}

/// Tells every peer to persist `record`, which was committed from `entry`. Returns how many peers
/// confirmed. Peers that miss the notification catch up later.
pub(super) async fn broadcast_commit<'a>(
    logger: &slog::Logger,
    peers: impl Iterator<Item = &'a Peer>,
    leader_id: NodeId,
    entry: &LogEntry,
    record: &OrderRecord,
) -> usize {
    let mut in_flight = Vec::new();
    for peer in peers {
        let peer = peer.clone();
        let rpc_request = ProtoCommitRecordReq {
            leader_id: leader_id.as_u64(),
            record: Some(record.clone().into()),
            entry: Some(entry.clone().into()),
        };
        in_flight.push((
            peer.node_id(),
            tokio::task::spawn(async move { peer.client.commit_record(rpc_request).await }),
        ));
    }

    let mut num_confirmed = 0;
    for (peer_id, handle) in in_flight {
        let outcome = match handle.await {
            Ok(Ok(rpc_result)) => match rpc_result.result {
                Some(proto_commit_record_result::Result::Ok(_)) => Ok(()),
                Some(proto_commit_record_result::Result::Err(err)) => Err(format!("{:?}", err.err)),
                None => Err("Malformed CommitRecord Result".to_string()),
            },
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) => Err(format!("Commit task failed: {:?}", join_error)),
        };

        match outcome {
            Ok(()) => num_confirmed += 1,
            Err(reason) => slog::warn!(
                logger,
                "{:?} did not confirm order {}: {}",
                peer_id,
                record.order_number,
                reason
            ),
        }
    }

    num_confirmed
}
