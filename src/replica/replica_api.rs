use crate::commitlog::Index;
use crate::replica::catch_up::CatchUpError;
use crate::replica::log_entry::{LogEntry, Term};
use crate::replica::order_record::OrderRecord;
use crate::replica::order_state_machine::ApplyError;
use crate::replica::peers::{NodeDescriptor, NodeId};
use crate::replica::replication_log::ReplicationLogError;
use std::io;
use std::net::Ipv4Addr;

#[derive(Debug)]
pub(crate) struct SubmitOrderInput {
    pub(crate) item_name: String,
    // Signed so that negative quantities from the wire are rejected here, not silently wrapped.
    pub(crate) quantity: i64,
}

#[derive(Debug)]
pub(crate) struct SubmitOrderOutput {
    pub(crate) order_number: u64,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SubmitOrderError {
    #[error("Quantity must be greater than 0")]
    InvalidQuantity,
    #[error("Item {0:?} is not in the catalog")]
    UnknownItem(String),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },
    #[error("Replicated to {acks} of {required} required members")]
    QuorumNotReached { acks: usize, required: usize },

    // Callers should re-run election rather than retry the write.
    #[error("No leader is known")]
    LeaderUnknown,
    #[error("I'm not leader")]
    NotLeader(LeaderRedirectInfo),

    #[error("Failed to persist log: {0}")]
    LocalIoError(io::Error),
    #[error("Failed to catch up before replicating: {0}")]
    CatchUpFailed(CatchUpError),
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    // Committed here, but too few members confirmed persisting it to survive losing this node.
    #[error("Order {order_number} committed but only {acks} of {required} required members confirmed it")]
    CommitUnconfirmed {
        order_number: u64,
        acks: usize,
        required: usize,
    },
}

impl From<ApplyError> for SubmitOrderError {
    fn from(e: ApplyError) -> Self {
        match e {
            ApplyError::InvalidQuantity => SubmitOrderError::InvalidQuantity,
            ApplyError::UnknownItem(item_name) => SubmitOrderError::UnknownItem(item_name),
            ApplyError::InsufficientStock { requested, available } => {
                SubmitOrderError::InsufficientStock { requested, available }
            }
            ApplyError::CatalogUnavailable(message) => SubmitOrderError::CatalogUnavailable(message),
            ApplyError::Io(e) => SubmitOrderError::LocalIoError(e),
            other @ ApplyError::OrderGap { .. }
            | other @ ApplyError::RecordConflict { .. }
            | other @ ApplyError::AlreadyCommitted(_) => {
                SubmitOrderError::LocalIoError(io::Error::new(io::ErrorKind::Other, other.to_string()))
            }
        }
    }
}

impl From<ReplicationLogError> for SubmitOrderError {
    fn from(e: ReplicationLogError) -> Self {
        match e {
            ReplicationLogError::Io(e) => SubmitOrderError::LocalIoError(e),
            other => SubmitOrderError::LocalIoError(io::Error::new(io::ErrorKind::Other, other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LeaderRedirectInfo {
    pub(crate) node_id: NodeId,
    pub(crate) ip_addr: Ipv4Addr,
    pub(crate) rpc_port: u16,
}

#[derive(Debug)]
pub(crate) struct ProposeEntryInput {
    pub(crate) leader_id: NodeId,
    pub(crate) entry: LogEntry,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProposeEntryError {
    #[error("Proposing leader's term is out of date")]
    StaleTerm { current_term: Term },
    #[error("Entry {index:?} conflicts with a committed entry")]
    LogConflict { index: Index },
    #[error("Failed to catch up to the proposed entry: {0}")]
    CatchUpFailed(CatchUpError),
    #[error("Replication log failure: {0}")]
    LogFailure(ReplicationLogError),
}

#[derive(Debug)]
pub(crate) struct CommitRecordInput {
    pub(crate) leader_id: NodeId,
    pub(crate) record: OrderRecord,
    // The leader's entry at `record.log_index`.
    pub(crate) entry: LogEntry,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CommitRecordError {
    #[error("Failed to catch up to the committed record: {0}")]
    CatchUpFailed(CatchUpError),
    #[error("Failed to persist order record: {0}")]
    ApplyFailure(ApplyError),
}

#[derive(Debug)]
pub(crate) struct TruncateFromInput {
    pub(crate) leader_id: NodeId,
    pub(crate) index: Index,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum TruncateFromError {
    #[error("Refusing to truncate committed entries (commit index {commit_index:?})")]
    CommittedEntry { commit_index: Index },
    #[error("Replication log failure: {0}")]
    LogFailure(ReplicationLogError),
}

#[derive(Debug)]
pub(crate) struct FetchEntryOutput {
    pub(crate) entry: LogEntry,
    pub(crate) committed_record: Option<OrderRecord>,
}

#[derive(Debug)]
pub(crate) struct LastIndexOutput {
    pub(crate) last_index: Option<Index>,
    pub(crate) commit_index: Option<Index>,
}

#[derive(Debug)]
pub(crate) struct PingOutput {
    pub(crate) node_id: NodeId,
    pub(crate) term: Term,
}

#[derive(Debug)]
pub(crate) struct LeaderAnnouncement {
    pub(crate) leader_id: NodeId,
    pub(crate) term: Term,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum LeaderAnnouncementError {
    #[error("Announced leader {0:?} is not in the cluster")]
    LeaderNotInCluster(NodeId),
    #[error("ElectLeader was sent to the wrong node (announced leader {0:?})")]
    NotMe(NodeId),
}

/// A point-in-time snapshot of a node, for operators and tests.
#[derive(Debug, Clone)]
pub(crate) struct ReplicaStatus {
    pub(crate) descriptor: NodeDescriptor,
    pub(crate) leader_id: Option<NodeId>,
    pub(crate) last_index: Option<Index>,
    pub(crate) commit_index: Option<Index>,
    pub(crate) last_order_number: u64,
}
