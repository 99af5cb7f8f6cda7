use crate::commitlog::Log;
use crate::replica::log_entry::{LogEntry, Term};
use crate::replica::order_record::OrderRecord;
use crate::replica::order_state_machine::OrderStateMachine;
use crate::replica::peers::NodeId;
use crate::replica::replication_log::ReplicationLog;

/// This node's belief of who the leader is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum CurrentLeader {
    Me,
    Other(NodeId),
    Unknown,
}

/// NodeState is everything a node mutates. It lives behind the node's RwLock: mutations take the
/// write guard, lookups share the read guard.
pub(crate) struct NodeState<L, T>
where
    L: Log<LogEntry>,
    T: Log<OrderRecord>,
{
    pub(crate) log: ReplicationLog<L>,
    pub(crate) orders: OrderStateMachine<T>,
    pub(crate) leader: CurrentLeader,
    pub(crate) term: Term,
    // Set when this node becomes leader; cleared once it has caught up with the most advanced
    // peer and dropped its own uncommitted tail.
    pub(crate) needs_leader_sync: bool,
}

impl<L, T> NodeState<L, T>
where
    L: Log<LogEntry>,
    T: Log<OrderRecord>,
{
    pub(crate) fn new(log: ReplicationLog<L>, orders: OrderStateMachine<T>) -> Self {
        // Terms aren't persisted separately; the last entry carries the newest term we've seen.
        let term = log.last_term();

        NodeState {
            log,
            orders,
            leader: CurrentLeader::Unknown,
            term,
            needs_leader_sync: false,
        }
    }

    /// Adopts `term` if it's newer. Returns true if the term moved forward.
    pub(crate) fn observe_term(&mut self, term: Term) -> bool {
        if term > self.term {
            self.term = term;
            true
        } else {
            false
        }
    }

    /// Records `leader_id` as leader, stepping down if that isn't me.
    pub(crate) fn follow(&mut self, leader_id: NodeId) {
        if self.leader != CurrentLeader::Other(leader_id) {
            self.leader = CurrentLeader::Other(leader_id);
            self.needs_leader_sync = false;
        }
    }

    pub(crate) fn lead(&mut self) {
        self.leader = CurrentLeader::Me;
        self.needs_leader_sync = true;
    }

    pub(crate) fn forget_leader(&mut self) {
        self.leader = CurrentLeader::Unknown;
        self.needs_leader_sync = false;
    }
}
