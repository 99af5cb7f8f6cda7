mod catch_up;
mod log_entry;
mod node_state;
mod order_record;
mod order_state_machine;
mod peer_client;
mod peers;
mod replica;
mod replica_api;
mod replication;
mod replication_log;

pub use catch_up::CatchUpError;
pub use catch_up::CatchUpOutcome;
pub use log_entry::EventKind;
pub use log_entry::LogEntry;
pub use log_entry::OrderPayload;
pub use log_entry::Term;
pub use order_record::OrderRecord;
pub use order_state_machine::ApplyError;
pub use peer_client::PeerError;
pub use peers::NodeDescriptor;
pub use peers::NodeId;
pub use peers::Role;
pub use replication_log::ReplicationLogError;

pub(crate) use order_state_machine::OrderStateMachine;
pub(crate) use peer_client::PeerClient;
pub(crate) use peers::{ClusterTracker, MemberMetadata, Peer};
pub(crate) use replica::{Replica, ReplicaConfig};
pub(crate) use replica_api::{
    CommitRecordError, CommitRecordInput, FetchEntryOutput, LastIndexOutput, LeaderAnnouncement,
    LeaderAnnouncementError, LeaderRedirectInfo, PingOutput, ProposeEntryError, ProposeEntryInput, ReplicaStatus,
    SubmitOrderError, SubmitOrderInput, SubmitOrderOutput, TruncateFromError, TruncateFromInput,
};
pub(crate) use replication_log::ReplicationLog;
