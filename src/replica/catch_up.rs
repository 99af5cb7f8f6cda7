use crate::commitlog::{Index, Log};
use crate::grpc::{proto_fetch_entry_result, ProtoFetchEntryReq};
use crate::replica::log_entry::LogEntry;
use crate::replica::node_state::NodeState;
use crate::replica::order_record::OrderRecord;
use crate::replica::order_state_machine::ApplyError;
use crate::replica::peer_client::PeerError;
use crate::replica::peers::{NodeId, Peer};
use crate::replica::replication_log::ReplicationLogError;
use std::convert::TryFrom;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum CatchUpError {
    #[error("Catch-up source {0:?} is unreachable: {1}")]
    PeerUnreachable(NodeId, PeerError),
    #[error("Catch-up source {0:?} is not a cluster member")]
    UnknownSource(NodeId),
    #[error("Catch-up source is missing entry {0}")]
    SourceMissingEntry(u64),
    #[error("Expected entry {expected} from catch-up source, but got entry {found}")]
    LogInconsistency { expected: u64, found: u64 },
    #[error("Catch-up source's entry {0} conflicts with a locally committed entry")]
    CommittedConflict(u64),
    #[error("Malformed entry from catch-up source: {0}")]
    MalformedEntry(&'static str),
    #[error("Replication log failure during catch-up: {0}")]
    Log(#[from] ReplicationLogError),
    #[error("Order table failure during catch-up: {0}")]
    Apply(#[from] ApplyError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CatchUpOutcome {
    pub entries_appended: usize,
    pub records_persisted: usize,
}

/// Brings the local log (and order table) up to `target` by fetching every index after our commit
/// index from `source`, in ascending order. Entries we already hold are left alone, divergent
/// uncommitted entries are replaced, so running it twice is a no-op the second time.
///
/// The caller must hold the node's replication gate, so that no proposal is accepted mid-catch-up.
/// The state lock is only taken per fetched entry, which keeps local reads flowing.
pub(crate) async fn sync_to<L, T>(
    logger: &slog::Logger,
    source: &Peer,
    state: &RwLock<NodeState<L, T>>,
    target: Index,
) -> Result<CatchUpOutcome, CatchUpError>
where
    L: Log<LogEntry>,
    T: Log<OrderRecord>,
{
    let start = match state.read().await.orders.commit_index() {
        None => Index::start_index(),
        Some(commit_index) => commit_index.plus(1),
    };

    let mut outcome = CatchUpOutcome::default();
    if start > target {
        return Ok(outcome);
    }

    slog::info!(
        logger,
        "Catching up from {:?} over indexes [{:?}, {:?}]",
        source.node_id(),
        start,
        target
    );

    let mut index = start;
    while index <= target {
        let (entry, record) = fetch(source, index).await?;

        let mut guard = state.write().await;
        let state = &mut *guard;

        match state.log.entry_at(index)? {
            Some(existing) if existing == entry => {}
            Some(_) => {
                if Some(index) <= state.orders.commit_index() {
                    return Err(CatchUpError::CommittedConflict(index.as_u64()));
                }
                slog::warn!(logger, "Replacing divergent uncommitted entry {:?}", index);
                state.log.truncate_from(index)?;
                state.log.append(entry)?;
                outcome.entries_appended += 1;
            }
            None => {
                state.log.append(entry)?;
                outcome.entries_appended += 1;
            }
        }

        if let Some(record) = record {
            if state.orders.persist_replicated(record)? {
                outcome.records_persisted += 1;
            }
        }

        index = index.plus(1);
    }

    slog::info!(logger, "Caught up to {:?}: {:?}", target, outcome);
    Ok(outcome)
}

async fn fetch(source: &Peer, index: Index) -> Result<(LogEntry, Option<OrderRecord>), CatchUpError> {
    let reply = source
        .client
        .fetch_entry(ProtoFetchEntryReq { index: index.as_u64() })
        .await
        .map_err(|e| CatchUpError::PeerUnreachable(source.node_id(), e))?;

    let found = match reply.result {
        Some(proto_fetch_entry_result::Result::Found(found)) => found,
        Some(proto_fetch_entry_result::Result::NotFound(_)) => {
            return Err(CatchUpError::SourceMissingEntry(index.as_u64()))
        }
        None => return Err(CatchUpError::MalformedEntry("Missing FetchEntry result")),
    };

    let entry = found
        .entry
        .ok_or(CatchUpError::MalformedEntry("Missing fetched entry"))
        .and_then(|proto| LogEntry::try_from(proto).map_err(CatchUpError::MalformedEntry))?;
    if entry.index != index {
        return Err(CatchUpError::LogInconsistency {
            expected: index.as_u64(),
            found: entry.index.as_u64(),
        });
    }

    let record = match found.committed_record {
        None => None,
        Some(proto) => Some(OrderRecord::try_from(proto).map_err(CatchUpError::MalformedEntry)?),
    };
    if let Some(record) = &record {
        if record.log_index != index {
            return Err(CatchUpError::LogInconsistency {
                expected: index.as_u64(),
                found: record.log_index.as_u64(),
            });
        }
    }

    Ok((entry, record))
}
