use crate::catalog::{Catalog, CatalogError};
use crate::commitlog::{Index, Log};
use crate::replica::catch_up::{self, CatchUpError, CatchUpOutcome};
use crate::replica::log_entry::{LogEntry, OrderPayload};
use crate::replica::node_state::{CurrentLeader, NodeState};
use crate::replica::order_record::OrderRecord;
use crate::replica::order_state_machine::OrderStateMachine;
use crate::replica::peers::{ClusterTracker, NodeDescriptor, NodeId, Peer, Role};
use crate::replica::replica_api::{
    CommitRecordError, CommitRecordInput, FetchEntryOutput, LastIndexOutput, LeaderAnnouncement,
    LeaderAnnouncementError, LeaderRedirectInfo, PingOutput, ProposeEntryError, ProposeEntryInput, ReplicaStatus,
    SubmitOrderError, SubmitOrderInput, SubmitOrderOutput, TruncateFromError, TruncateFromInput,
};
use crate::replica::replication;
use crate::replica::replication_log::{ReplicationLog, ReplicationLogError};
use std::io;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub(crate) struct ReplicaConfig<L, T>
where
    L: Log<LogEntry>,
    T: Log<OrderRecord>,
{
    pub logger: slog::Logger,
    pub cluster_tracker: ClusterTracker,
    pub log: ReplicationLog<L>,
    pub orders: OrderStateMachine<T>,
    pub catalog: Arc<dyn Catalog>,
}

/// Replica is one order-processing node. Any number of RPC handlers run against it concurrently.
///
/// Two guards protect it:
/// * `state` is a read/write lock over everything the node mutates. Lookups share the read guard.
/// * `replication_gate` serializes replication rounds, proposals, commit notifications,
///   truncation and catch-up. Read-only handlers never touch it, so two nodes that are both
///   mid-round can still serve each other's catch-up fetches.
pub(crate) struct Replica<L, T>
where
    L: Log<LogEntry>,
    T: Log<OrderRecord>,
{
    logger: slog::Logger,
    my_node_id: NodeId,
    cluster_tracker: ClusterTracker,
    catalog: Arc<dyn Catalog>,
    state: RwLock<NodeState<L, T>>,
    replication_gate: Mutex<()>,
}

impl<L, T> Replica<L, T>
where
    L: Log<LogEntry> + Send + Sync + 'static,
    T: Log<OrderRecord> + Send + Sync + 'static,
{
    pub(crate) fn new(config: ReplicaConfig<L, T>) -> Self {
        let my_node_id = config.cluster_tracker.my_node_id();

        Replica {
            logger: config.logger,
            my_node_id,
            cluster_tracker: config.cluster_tracker,
            catalog: config.catalog,
            state: RwLock::new(NodeState::new(config.log, config.orders)),
            replication_gate: Mutex::new(()),
        }
    }

    pub(crate) fn my_node_id(&self) -> NodeId {
        self.my_node_id
    }

    // ------- Client facing -------

    pub(crate) async fn handle_submit_order(
        &self,
        input: SubmitOrderInput,
    ) -> Result<SubmitOrderOutput, SubmitOrderError> {
        let _gate = self.replication_gate.lock().await;

        // Leader check
        {
            let state = self.state.read().await;
            self.leader_check(&state)?;
        }

        // Validate before touching any log, so rejected orders leave no trace.
        if input.quantity <= 0 {
            return Err(SubmitOrderError::InvalidQuantity);
        }
        let quantity = input.quantity as u64;
        self.check_stock(&input.item_name, quantity).await?;

        self.establish_leadership_if_needed().await?;

        let entry = {
            let state = self.state.read().await;
            LogEntry::new_order(
                state.log.next_index(),
                state.term,
                OrderPayload {
                    item_name: input.item_name,
                    quantity,
                },
            )
        };

        let record = self.propose_and_commit(entry).await?;

        Ok(SubmitOrderOutput {
            order_number: record.order_number,
        })
    }

    pub(crate) async fn handle_get_order(&self, order_number: u64) -> Result<Option<OrderRecord>, io::Error> {
        self.state.read().await.orders.get(order_number)
    }

    fn leader_check(&self, state: &NodeState<L, T>) -> Result<(), SubmitOrderError> {
        match state.leader {
            CurrentLeader::Me => Ok(()),
            CurrentLeader::Other(leader_id) => match self.cluster_tracker.metadata(leader_id) {
                Some(leader) => Err(SubmitOrderError::NotLeader(LeaderRedirectInfo {
                    node_id: leader_id,
                    ip_addr: leader.ip_addr(),
                    rpc_port: leader.rpc_port(),
                })),
                None => Err(SubmitOrderError::LeaderUnknown),
            },
            CurrentLeader::Unknown => Err(SubmitOrderError::LeaderUnknown),
        }
    }

    async fn check_stock(&self, item_name: &str, quantity: u64) -> Result<(), SubmitOrderError> {
        match self.catalog.available_quantity(item_name).await {
            Ok(available) if available >= quantity => Ok(()),
            Ok(available) => Err(SubmitOrderError::InsufficientStock {
                requested: quantity,
                available,
            }),
            Err(CatalogError::UnknownItem(item_name)) => Err(SubmitOrderError::UnknownItem(item_name)),
            Err(CatalogError::InsufficientStock { requested, available }) => {
                Err(SubmitOrderError::InsufficientStock { requested, available })
            }
            Err(CatalogError::Unavailable(message)) => Err(SubmitOrderError::CatalogUnavailable(message)),
        }
    }

    /// A freshly elected leader may be missing commits that happened under the previous leader,
    /// and may hold speculative entries that never committed. Before its first round it catches up
    /// with the most advanced reachable peer, then drops its own uncommitted tail.
    async fn establish_leadership_if_needed(&self) -> Result<(), SubmitOrderError> {
        let my_commit_index = {
            let state = self.state.read().await;
            if !state.needs_leader_sync {
                return Ok(());
            }
            state.orders.commit_index()
        };

        slog::info!(self.logger, "Establishing leadership. My commit index: {:?}", my_commit_index);

        let mut in_flight = Vec::new();
        for peer in self.cluster_tracker.iter_peers() {
            let peer = peer.clone();
            in_flight.push(tokio::task::spawn(async move {
                let reply = peer.client.last_index().await;
                (peer, reply)
            }));
        }

        let mut num_responses = 1;
        let mut most_advanced: Option<(Peer, Index)> = None;
        for handle in in_flight {
            match handle.await {
                Ok((peer, Ok(reply))) => {
                    num_responses += 1;
                    let peer_commit_index = Index::from_u64(reply.commit_index);
                    if peer_commit_index > most_advanced.as_ref().map(|(_, index)| *index) {
                        most_advanced = peer_commit_index.map(|index| (peer, index));
                    }
                }
                Ok((peer, Err(e))) => {
                    slog::warn!(self.logger, "Can't reach {:?} while establishing leadership: {}", peer.node_id(), e)
                }
                Err(join_error) => slog::warn!(self.logger, "LastIndex task failed: {:?}", join_error),
            }
        }

        // Without a majority we can't know the highest commit.
        let required = self.cluster_tracker.majority();
        if num_responses < required {
            return Err(SubmitOrderError::QuorumNotReached {
                acks: num_responses,
                required,
            });
        }

        if let Some((peer, peer_commit_index)) = most_advanced {
            if Some(peer_commit_index) > my_commit_index {
                catch_up::sync_to(&self.logger, &peer, &self.state, peer_commit_index)
                    .await
                    .map_err(SubmitOrderError::CatchUpFailed)?;
            }
        }

        let mut state = self.state.write().await;
        let first_uncommitted = match state.orders.commit_index() {
            None => Index::start_index(),
            Some(commit_index) => commit_index.plus(1),
        };
        state.log.truncate_from(first_uncommitted)?;
        state.needs_leader_sync = false;

        slog::info!(
            self.logger,
            "Leadership established on term {:?}. Log ends at {:?}",
            state.term,
            state.log.last_index()
        );
        Ok(())
    }

    async fn propose_and_commit(&self, entry: LogEntry) -> Result<OrderRecord, SubmitOrderError> {
        let logger = self.logger.new(slog::o!("Index" => entry.index.as_u64()));
        let index = entry.index;

        let round =
            replication::propose_to_peers(&logger, self.cluster_tracker.iter_peers(), self.my_node_id, &entry).await;

        let required = self.cluster_tracker.majority();
        if !replication::has_quorum(round.num_acks(), self.cluster_tracker.num_members()) {
            slog::warn!(
                logger,
                "Quorum not reached ({}/{} acks, excluded {:?}). Rolling back.",
                round.num_acks(),
                required,
                round.excluded
            );
            self.roll_back_peers(&logger, &round.acked, index).await;
            if self.react_to_rejections(&logger, &round).await {
                // Nothing was written, and the client should find the new leader and retry.
                return Err(SubmitOrderError::LeaderUnknown);
            }
            return Err(SubmitOrderError::QuorumNotReached {
                acks: round.num_acks(),
                required,
            });
        }

        let record = match self.commit_locally(&logger, &entry).await {
            Ok(record) => record,
            Err(e) => {
                slog::warn!(logger, "Failed to commit after reaching quorum: {}. Rolling back.", e);
                self.roll_back_peers(&logger, &round.acked, index).await;
                return Err(e);
            }
        };

        let num_confirmed = 1 + replication::broadcast_commit(
            &logger,
            self.cluster_tracker.iter_peers(),
            self.my_node_id,
            &entry,
            &record,
        )
        .await;

        // Only a majority of persisted copies is guaranteed to be seen by the next leader.
        if !replication::has_quorum(num_confirmed, self.cluster_tracker.num_members()) {
            slog::warn!(
                logger,
                "Order {} committed locally, but only {}/{} members confirmed it",
                record.order_number,
                num_confirmed,
                required
            );
            return Err(SubmitOrderError::CommitUnconfirmed {
                order_number: record.order_number,
                acks: num_confirmed,
                required,
            });
        }

        slog::info!(
            logger,
            "Committed order {} with {}/{} confirmations",
            record.order_number,
            num_confirmed,
            self.cluster_tracker.num_members()
        );
        Ok(record)
    }

    /// Appends and applies under one write lock, so readers never see an entry without its order.
    async fn commit_locally(&self, logger: &slog::Logger, entry: &LogEntry) -> Result<OrderRecord, SubmitOrderError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        match state.log.append(entry.clone()) {
            Ok(_) => {}
            Err(ReplicationLogError::IndexMismatch { expected, found }) => panic!(
                "Leader log moved during a replication round. Expected to append {:?}, proposed {:?}",
                expected, found
            ),
            Err(e) => return Err(e.into()),
        }

        match state.orders.apply(entry).await {
            Ok(record) => Ok(record),
            Err(e) => {
                if let Err(truncate_error) = state.log.truncate_from(entry.index) {
                    slog::error!(logger, "Failed to remove uncommitted entry: {:?}", truncate_error);
                    // Leadership establishment drops the tail before the next round.
                    state.needs_leader_sync = true;
                }
                Err(e.into())
            }
        }
    }

    async fn roll_back_peers(&self, logger: &slog::Logger, acked: &[NodeId], index: Index) {
        if acked.is_empty() {
            return;
        }

        let acked_peers = self
            .cluster_tracker
            .iter_peers()
            .filter(|peer| acked.contains(&peer.node_id()));
        replication::roll_back(logger, acked_peers, self.my_node_id, index).await;
    }

    /// Returns true if a peer on a newer term made us step down.
    async fn react_to_rejections(&self, logger: &slog::Logger, round: &replication::ProposalRound) -> bool {
        if round.newer_term.is_none() && !round.log_conflict {
            return false;
        }

        let mut stepped_down = false;
        let mut state = self.state.write().await;
        if let Some(newer_term) = round.newer_term {
            if state.observe_term(newer_term) {
                slog::warn!(logger, "A peer is on newer term {:?}. Stepping down.", newer_term);
                state.forget_leader();
                stepped_down = true;
            }
        }
        if round.log_conflict && state.leader == CurrentLeader::Me {
            slog::warn!(logger, "A peer holds commits I'm missing. Re-syncing before the next round.");
            state.needs_leader_sync = true;
        }

        stepped_down
    }

    // ------- Replication plane (leader -> follower) -------

    pub(crate) async fn server_handle_propose_entry(&self, input: ProposeEntryInput) -> Result<(), ProposeEntryError> {
        let _gate = self.replication_gate.lock().await;
        let index = input.entry.index;

        let next_index = {
            let mut state = self.state.write().await;
            if input.entry.term < state.term {
                return Err(ProposeEntryError::StaleTerm {
                    current_term: state.term,
                });
            }
            state.observe_term(input.entry.term);
            self.adopt_leader(&mut state, input.leader_id);
            state.log.next_index()
        };

        if index > next_index {
            slog::info!(
                self.logger,
                "Proposal for {:?} leaves a gap after {:?}. Catching up first.",
                index,
                next_index
            );
            if let Some(target) = index.checked_minus(1) {
                self.catch_up_from(input.leader_id, target)
                    .await
                    .map_err(ProposeEntryError::CatchUpFailed)?;
            }
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let next_index = state.log.next_index();

        if index > next_index {
            return Err(ProposeEntryError::CatchUpFailed(CatchUpError::SourceMissingEntry(
                next_index.as_u64(),
            )));
        }
        if index == next_index {
            state.log.append(input.entry).map_err(ProposeEntryError::LogFailure)?;
            return Ok(());
        }

        // We already hold something at `index`.
        let existing = state.log.entry_at(index).map_err(ProposeEntryError::LogFailure)?;
        if existing.as_ref() == Some(&input.entry) {
            return Ok(());
        }
        if Some(index) <= state.orders.commit_index() {
            slog::error!(
                self.logger,
                "Leader {:?} proposed {:?} which conflicts with my committed entry",
                input.leader_id,
                index
            );
            return Err(ProposeEntryError::LogConflict { index });
        }

        slog::info!(self.logger, "Replacing uncommitted entries from {:?}", index);
        state.log.truncate_from(index).map_err(ProposeEntryError::LogFailure)?;
        state.log.append(input.entry).map_err(ProposeEntryError::LogFailure)?;
        Ok(())
    }

    pub(crate) async fn server_handle_commit_record(&self, input: CommitRecordInput) -> Result<(), CommitRecordError> {
        let _gate = self.replication_gate.lock().await;

        let target = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            self.adopt_leader(state, input.leader_id);

            let record = &input.record;
            if record.order_number <= state.orders.last_order_number() {
                // Duplicate notification, or a conflict that persist_replicated reports.
                return state
                    .orders
                    .persist_replicated(input.record)
                    .map(|_| ())
                    .map_err(CommitRecordError::ApplyFailure);
            }

            let is_next_order = record.order_number == state.orders.last_order_number() + 1
                && Some(record.log_index) > state.orders.commit_index();
            // Our entry at that index may be a leftover from an older leader's round.
            let holds_entry = match state.log.entry_at(record.log_index) {
                Ok(Some(entry)) => entry == input.entry,
                _ => false,
            };
            if is_next_order && holds_entry {
                state
                    .orders
                    .persist_replicated(input.record)
                    .map_err(CommitRecordError::ApplyFailure)?;
                return Ok(());
            }

            record.log_index
        };

        slog::info!(
            self.logger,
            "Commit notification for {:?} is out of order. Catching up.",
            target
        );
        self.catch_up_from(input.leader_id, target)
            .await
            .map(|_| ())
            .map_err(CommitRecordError::CatchUpFailed)
    }

    pub(crate) async fn server_handle_truncate_from(&self, input: TruncateFromInput) -> Result<(), TruncateFromError> {
        let _gate = self.replication_gate.lock().await;
        let mut state = self.state.write().await;

        if let Some(commit_index) = state.orders.commit_index() {
            if input.index <= commit_index {
                slog::warn!(
                    self.logger,
                    "{:?} asked to truncate from {:?}, but that's committed",
                    input.leader_id,
                    input.index
                );
                return Err(TruncateFromError::CommittedEntry { commit_index });
            }
        }

        state
            .log
            .truncate_from(input.index)
            .map_err(TruncateFromError::LogFailure)
    }

    fn adopt_leader(&self, state: &mut NodeState<L, T>, leader_id: NodeId) {
        if leader_id == self.my_node_id || !self.cluster_tracker.contains_member(leader_id) {
            return;
        }
        if state.leader != CurrentLeader::Other(leader_id) {
            slog::info!(
                self.logger,
                "Following {:?} (previously {:?}) on term {:?}",
                leader_id,
                state.leader,
                state.term
            );
            state.follow(leader_id);
        }
    }

    // ------- Catch-up plane -------

    pub(crate) async fn server_handle_fetch_entry(
        &self,
        index: Index,
    ) -> Result<Option<FetchEntryOutput>, ReplicationLogError> {
        let state = self.state.read().await;

        match state.log.entry_at(index)? {
            None => Ok(None),
            Some(entry) => Ok(Some(FetchEntryOutput {
                entry,
                committed_record: state.orders.record_for_log_index(index)?,
            })),
        }
    }

    pub(crate) async fn server_handle_last_index(&self) -> LastIndexOutput {
        let state = self.state.read().await;

        LastIndexOutput {
            last_index: state.log.last_index(),
            commit_index: state.orders.commit_index(),
        }
    }

    async fn catch_up_from(&self, source_id: NodeId, target: Index) -> Result<CatchUpOutcome, CatchUpError> {
        let source = self
            .cluster_tracker
            .peer(source_id)
            .ok_or(CatchUpError::UnknownSource(source_id))?;

        catch_up::sync_to(&self.logger, source, &self.state, target).await
    }

    /// Polls the believed leader and catches up to its commit index if we're behind. Run in the
    /// background after learning of a new leader, and whenever a caller wants to force it.
    pub(crate) async fn sync_with_leader(&self) -> Result<CatchUpOutcome, CatchUpError> {
        let leader_id = match self.state.read().await.leader {
            CurrentLeader::Other(leader_id) => leader_id,
            CurrentLeader::Me | CurrentLeader::Unknown => return Ok(CatchUpOutcome::default()),
        };
        let leader = self
            .cluster_tracker
            .peer(leader_id)
            .ok_or(CatchUpError::UnknownSource(leader_id))?;

        let reply = leader
            .client
            .last_index()
            .await
            .map_err(|e| CatchUpError::PeerUnreachable(leader_id, e))?;
        let leader_commit_index = match Index::from_u64(reply.commit_index) {
            None => return Ok(CatchUpOutcome::default()),
            Some(index) => index,
        };

        let _gate = self.replication_gate.lock().await;
        catch_up::sync_to(&self.logger, leader, &self.state, leader_commit_index).await
    }

    // ------- Election plane -------

    pub(crate) async fn server_handle_ping(&self) -> PingOutput {
        PingOutput {
            node_id: self.my_node_id,
            term: self.state.read().await.term,
        }
    }

    pub(crate) async fn server_handle_elect_leader(
        &self,
        announcement: LeaderAnnouncement,
    ) -> Result<(), LeaderAnnouncementError> {
        if announcement.leader_id != self.my_node_id {
            return Err(LeaderAnnouncementError::NotMe(announcement.leader_id));
        }

        let mut state = self.state.write().await;
        state.observe_term(announcement.term);
        state.lead();
        slog::info!(self.logger, "Elected leader on term {:?}", state.term);

        Ok(())
    }

    pub(crate) async fn server_handle_inform_leader(
        &self,
        announcement: LeaderAnnouncement,
    ) -> Result<(), LeaderAnnouncementError> {
        if !self.cluster_tracker.contains_member(announcement.leader_id) {
            return Err(LeaderAnnouncementError::LeaderNotInCluster(announcement.leader_id));
        }

        let mut state = self.state.write().await;
        state.observe_term(announcement.term);
        if announcement.leader_id == self.my_node_id {
            if state.leader != CurrentLeader::Me {
                state.lead();
            }
        } else {
            state.follow(announcement.leader_id);
        }
        slog::info!(
            self.logger,
            "Informed that {:?} leads on term {:?}",
            announcement.leader_id,
            state.term
        );

        Ok(())
    }

    // ------- Introspection -------

    pub(crate) async fn status(&self) -> ReplicaStatus {
        let state = self.state.read().await;

        let (role, leader_id) = match state.leader {
            CurrentLeader::Me => (Role::Leader, Some(self.my_node_id)),
            CurrentLeader::Other(leader_id) => (Role::Follower, Some(leader_id)),
            CurrentLeader::Unknown => (Role::Follower, None),
        };

        ReplicaStatus {
            descriptor: NodeDescriptor {
                id: self.my_node_id,
                address: self.cluster_tracker.my_metadata().address(),
                role,
                term: state.term,
            },
            leader_id,
            last_index: state.log.last_index(),
            commit_index: state.orders.commit_index(),
            last_order_number: state.orders.last_order_number(),
        }
    }

    /// Every entry currently in the log, oldest first.
    pub(crate) async fn log_entries(&self) -> Result<Vec<LogEntry>, ReplicationLogError> {
        let state = self.state.read().await;

        let mut entries = Vec::new();
        let mut index = Index::start_index();
        while Some(index) <= state.log.last_index() {
            if let Some(entry) = state.log.entry_at(index)? {
                entries.push(entry);
            }
            index = index.plus(1);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::{Replica, ReplicaConfig};
    use crate::catalog::InMemoryCatalog;
    use crate::commitlog::{InMemoryLog, Index};
    use crate::grpc::grpc_order_node_server::{GrpcOrderNode, GrpcOrderNodeServer};
    use crate::grpc::{
        proto_commit_record_error, proto_commit_record_result, proto_propose_entry_error, proto_propose_entry_result,
        ProtoAck, ProtoCommitRecordError, ProtoCommitRecordReq, ProtoCommitRecordResult, ProtoElectLeaderReq,
        ProtoFetchEntryReq, ProtoFetchEntryResult, ProtoGetOrderReq, ProtoGetOrderResult, ProtoInformLeaderReq,
        ProtoLastIndexReply, ProtoLastIndexReq, ProtoLeaderAck, ProtoPingReply, ProtoPingReq, ProtoProposeEntryError,
        ProtoProposeEntryReq, ProtoProposeEntryResult, ProtoServerFault, ProtoStaleTerm, ProtoSubmitOrderReq,
        ProtoSubmitOrderResult, ProtoTruncateFromReq, ProtoTruncateFromResult,
    };
    use crate::replica::log_entry::{LogEntry, OrderPayload, Term};
    use crate::replica::order_record::OrderRecord;
    use crate::replica::order_state_machine::OrderStateMachine;
    use crate::replica::peer_client::PeerClient;
    use crate::replica::peers::{ClusterTracker, MemberMetadata, NodeId, Peer, Role};
    use crate::replica::replica_api::{
        CommitRecordError, CommitRecordInput, LeaderAnnouncement, LeaderAnnouncementError, ProposeEntryError,
        ProposeEntryInput, SubmitOrderError, SubmitOrderInput, TruncateFromError, TruncateFromInput,
    };
    use crate::replica::replication_log::ReplicationLog;
    use std::collections::HashMap;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::sync::Arc;
    use tokio::time::Duration;
    use tonic::transport::Server;
    use tonic::{Request, Response, Status};

    type TestReplica = Replica<InMemoryLog<LogEntry>, InMemoryLog<OrderRecord>>;

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn metadata(id: u64) -> MemberMetadata {
        // Nothing listens on these ports; none of these tests expect a peer call to succeed.
        MemberMetadata::new(NodeId::new(id), Ipv4Addr::LOCALHOST, 1 + id as u16)
    }

    fn replica(my_id: u64, peer_ids: &[u64], catalog: Arc<InMemoryCatalog>) -> TestReplica {
        let peers = peer_ids.iter().map(|peer_id| metadata(*peer_id)).collect();
        replica_with_peers(my_id, peers, catalog)
    }

    fn replica_with_peers(my_id: u64, members: Vec<MemberMetadata>, catalog: Arc<InMemoryCatalog>) -> TestReplica {
        let mut peers = HashMap::new();
        for metadata in members {
            let client =
                PeerClient::new(metadata.ip_addr(), metadata.rpc_port(), Duration::from_millis(100)).unwrap();
            peers.insert(metadata.node_id(), Peer { metadata, client });
        }

        Replica::new(ReplicaConfig {
            logger: logger(),
            cluster_tracker: ClusterTracker::new(metadata(my_id), peers),
            log: ReplicationLog::open(logger(), InMemoryLog::create().unwrap()).unwrap(),
            orders: OrderStateMachine::open(logger(), InMemoryLog::create().unwrap(), catalog.clone()).unwrap(),
            catalog,
        })
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(InMemoryCatalog::new(vec![("Tux", 10), ("Fox", 5)]))
    }

    fn order(item_name: &str, quantity: i64) -> SubmitOrderInput {
        SubmitOrderInput {
            item_name: item_name.to_string(),
            quantity,
        }
    }

    fn entry(index: u64, term: u64, item_name: &str) -> LogEntry {
        LogEntry::new_order(
            Index::new(index),
            Term::new(term),
            OrderPayload {
                item_name: item_name.to_string(),
                quantity: 1,
            },
        )
    }

    fn proposal(leader_id: u64, entry: LogEntry) -> ProposeEntryInput {
        ProposeEntryInput {
            leader_id: NodeId::new(leader_id),
            entry,
        }
    }

    fn commit(leader_id: u64, order_number: u64, entry: &LogEntry) -> CommitRecordInput {
        CommitRecordInput {
            leader_id: NodeId::new(leader_id),
            record: OrderRecord {
                order_number,
                item_name: entry.payload.item_name.clone(),
                quantity: entry.payload.quantity,
                log_index: entry.index,
            },
            entry: entry.clone(),
        }
    }

    async fn elect_self(replica: &TestReplica, term: u64) {
        replica
            .server_handle_elect_leader(LeaderAnnouncement {
                leader_id: replica.my_node_id(),
                term: Term::new(term),
            })
            .await
            .unwrap();
    }

    /// A peer that answers proposals and commit notifications with fixed replies, and otherwise
    /// reports an empty log.
    struct ScriptedPeer {
        propose_reply: proto_propose_entry_result::Result,
        commit_reply: proto_commit_record_result::Result,
    }

    #[async_trait::async_trait]
    impl GrpcOrderNode for ScriptedPeer {
        async fn propose_entry(
            &self,
            _request: Request<ProtoProposeEntryReq>,
        ) -> Result<Response<ProtoProposeEntryResult>, Status> {
            Ok(Response::new(ProtoProposeEntryResult {
                result: Some(self.propose_reply.clone()),
            }))
        }

        async fn commit_record(
            &self,
            _request: Request<ProtoCommitRecordReq>,
        ) -> Result<Response<ProtoCommitRecordResult>, Status> {
            Ok(Response::new(ProtoCommitRecordResult {
                result: Some(self.commit_reply.clone()),
            }))
        }

        async fn truncate_from(
            &self,
            _request: Request<ProtoTruncateFromReq>,
        ) -> Result<Response<ProtoTruncateFromResult>, Status> {
            Err(Status::unimplemented("TruncateFrom"))
        }

        async fn fetch_entry(
            &self,
            _request: Request<ProtoFetchEntryReq>,
        ) -> Result<Response<ProtoFetchEntryResult>, Status> {
            Err(Status::unimplemented("FetchEntry"))
        }

        async fn last_index(
            &self,
            _request: Request<ProtoLastIndexReq>,
        ) -> Result<Response<ProtoLastIndexReply>, Status> {
            Ok(Response::new(ProtoLastIndexReply {
                last_index: 0,
                commit_index: 0,
            }))
        }

        async fn ping(&self, _request: Request<ProtoPingReq>) -> Result<Response<ProtoPingReply>, Status> {
            Err(Status::unimplemented("Ping"))
        }

        async fn elect_leader(
            &self,
            _request: Request<ProtoElectLeaderReq>,
        ) -> Result<Response<ProtoLeaderAck>, Status> {
            Err(Status::unimplemented("ElectLeader"))
        }

        async fn inform_leader(
            &self,
            _request: Request<ProtoInformLeaderReq>,
        ) -> Result<Response<ProtoLeaderAck>, Status> {
            Err(Status::unimplemented("InformLeader"))
        }

        async fn submit_order(
            &self,
            _request: Request<ProtoSubmitOrderReq>,
        ) -> Result<Response<ProtoSubmitOrderResult>, Status> {
            Err(Status::unimplemented("SubmitOrder"))
        }

        async fn get_order(
            &self,
            _request: Request<ProtoGetOrderReq>,
        ) -> Result<Response<ProtoGetOrderResult>, Status> {
            Err(Status::unimplemented("GetOrder"))
        }
    }

    fn acked() -> proto_propose_entry_result::Result {
        proto_propose_entry_result::Result::Ok(ProtoAck { node_id: 2 })
    }

    fn confirmed() -> proto_commit_record_result::Result {
        proto_commit_record_result::Result::Ok(ProtoAck { node_id: 2 })
    }

    fn commit_failed() -> proto_commit_record_result::Result {
        proto_commit_record_result::Result::Err(ProtoCommitRecordError {
            err: Some(proto_commit_record_error::Err::ServerFault(ProtoServerFault {
                message: "Disk full".to_string(),
            })),
        })
    }

    /// Serves `peer` as node 2 on `port` and returns a replica for node 1 in that 2-member cluster.
    async fn replica_with_scripted_peer(port: u16, peer: ScriptedPeer, catalog: Arc<InMemoryCatalog>) -> TestReplica {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        tokio::spawn(Server::builder().add_service(GrpcOrderNodeServer::new(peer)).serve(addr));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let member = MemberMetadata::new(NodeId::new(2), Ipv4Addr::LOCALHOST, port);
        replica_with_peers(1, vec![member], catalog)
    }

    #[tokio::test]
    async fn single_node_commits_and_validates_orders() {
        let catalog = catalog();
        let replica = replica(1, &[], catalog.clone());
        elect_self(&replica, 1).await;

        let placed = replica.handle_submit_order(order("Tux", 5)).await.unwrap();
        assert_eq!(1, placed.order_number);

        assert!(matches!(
            replica.handle_submit_order(order("Tux", 20)).await,
            Err(SubmitOrderError::InsufficientStock {
                requested: 20,
                available: 5
            })
        ));
        assert!(matches!(
            replica.handle_submit_order(order("Tux", 0)).await,
            Err(SubmitOrderError::InvalidQuantity)
        ));
        assert!(matches!(
            replica.handle_submit_order(order("Tux", -3)).await,
            Err(SubmitOrderError::InvalidQuantity)
        ));
        assert!(matches!(
            replica.handle_submit_order(order("Whale", 1)).await,
            Err(SubmitOrderError::UnknownItem(_))
        ));

        // Rejections left no trace in the log.
        let status = replica.status().await;
        assert_eq!(Some(Index::new(1)), status.last_index);
        assert_eq!(Role::Leader, status.descriptor.role);

        let placed = replica.handle_submit_order(order("Fox", 1)).await.unwrap();
        assert_eq!(2, placed.order_number);

        let record = replica.handle_get_order(1).await.unwrap().unwrap();
        assert_eq!(("Tux".to_string(), 5), (record.item_name, record.quantity));
        assert!(replica.handle_get_order(3).await.unwrap().is_none());
        assert_eq!(Some(5), catalog.quantity("Tux"));
        assert_eq!(Some(4), catalog.quantity("Fox"));
    }

    #[tokio::test]
    async fn writes_need_a_leader() {
        let replica = replica(1, &[2, 3], catalog());

        assert!(matches!(
            replica.handle_submit_order(order("Tux", 1)).await,
            Err(SubmitOrderError::LeaderUnknown)
        ));

        replica
            .server_handle_inform_leader(LeaderAnnouncement {
                leader_id: NodeId::new(3),
                term: Term::new(1),
            })
            .await
            .unwrap();

        match replica.handle_submit_order(order("Tux", 1)).await {
            Err(SubmitOrderError::NotLeader(redirect)) => {
                assert_eq!(NodeId::new(3), redirect.node_id);
                assert_eq!(4, redirect.rpc_port);
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn leader_without_quorum_rejects_and_keeps_log_unchanged() {
        let replica = replica(1, &[2, 3], catalog());
        elect_self(&replica, 1).await;

        assert!(matches!(
            replica.handle_submit_order(order("Tux", 1)).await,
            Err(SubmitOrderError::QuorumNotReached { acks: 1, required: 2 })
        ));
        assert_eq!(None, replica.status().await.last_index);
    }

    #[tokio::test]
    async fn election_announcements_are_validated() {
        let replica = replica(1, &[2], catalog());

        assert!(matches!(
            replica
                .server_handle_elect_leader(LeaderAnnouncement {
                    leader_id: NodeId::new(2),
                    term: Term::new(1),
                })
                .await,
            Err(LeaderAnnouncementError::NotMe(_))
        ));
        assert!(matches!(
            replica
                .server_handle_inform_leader(LeaderAnnouncement {
                    leader_id: NodeId::new(9),
                    term: Term::new(1),
                })
                .await,
            Err(LeaderAnnouncementError::LeaderNotInCluster(_))
        ));

        elect_self(&replica, 4).await;
        let pong = replica.server_handle_ping().await;
        assert_eq!(NodeId::new(1), pong.node_id);
        assert_eq!(Term::new(4), pong.term);
    }

    #[tokio::test]
    async fn follower_handles_proposals_and_commits() {
        let replica = replica(1, &[2], catalog());

        // Accepting a proposal adopts the sender as leader.
        let first = entry(1, 2, "Tux");
        replica.server_handle_propose_entry(proposal(2, first.clone())).await.unwrap();
        assert_eq!(Some(NodeId::new(2)), replica.status().await.leader_id);

        // Re-delivery of the same entry is a no-op.
        replica.server_handle_propose_entry(proposal(2, first.clone())).await.unwrap();
        assert_eq!(Some(first.clone()), replica.server_handle_fetch_entry(Index::new(1)).await.unwrap().map(|f| f.entry));
        assert_eq!(Some(Index::new(1)), replica.status().await.last_index);

        replica.server_handle_commit_record(commit(2, 1, &first)).await.unwrap();
        replica.server_handle_commit_record(commit(2, 1, &first)).await.unwrap();
        let status = replica.status().await;
        assert_eq!(Some(Index::new(1)), status.commit_index);
        assert_eq!(1, status.last_order_number);

        // Older terms are refused.
        assert!(matches!(
            replica.server_handle_propose_entry(proposal(2, entry(2, 1, "Fox"))).await,
            Err(ProposeEntryError::StaleTerm { .. })
        ));

        // A different entry over a committed one is a conflict.
        assert!(matches!(
            replica.server_handle_propose_entry(proposal(2, entry(1, 2, "Fox"))).await,
            Err(ProposeEntryError::LogConflict { .. })
        ));

        // A different entry over a speculative one replaces it.
        replica.server_handle_propose_entry(proposal(2, entry(2, 2, "Fox"))).await.unwrap();
        replica.server_handle_propose_entry(proposal(2, entry(2, 3, "Tux"))).await.unwrap();
        let fetched = replica.server_handle_fetch_entry(Index::new(2)).await.unwrap().unwrap();
        assert_eq!("Tux", fetched.entry.payload.item_name);
        assert!(fetched.committed_record.is_none());

        let fetched = replica.server_handle_fetch_entry(Index::new(1)).await.unwrap().unwrap();
        assert_eq!(Some(1), fetched.committed_record.map(|r| r.order_number));
        assert!(replica.server_handle_fetch_entry(Index::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn truncate_only_removes_uncommitted_entries() {
        let replica = replica(1, &[2], catalog());
        let first = entry(1, 1, "Tux");
        replica.server_handle_propose_entry(proposal(2, first.clone())).await.unwrap();
        replica.server_handle_commit_record(commit(2, 1, &first)).await.unwrap();
        replica.server_handle_propose_entry(proposal(2, entry(2, 1, "Fox"))).await.unwrap();

        assert!(matches!(
            replica
                .server_handle_truncate_from(TruncateFromInput {
                    leader_id: NodeId::new(2),
                    index: Index::new(1),
                })
                .await,
            Err(TruncateFromError::CommittedEntry { .. })
        ));

        replica
            .server_handle_truncate_from(TruncateFromInput {
                leader_id: NodeId::new(2),
                index: Index::new(2),
            })
            .await
            .unwrap();

        let last = replica.server_handle_last_index().await;
        assert_eq!(Some(Index::new(1)), last.last_index);
        assert_eq!(Some(Index::new(1)), last.commit_index);
    }

    #[tokio::test]
    async fn gap_without_reachable_leader_fails_catch_up() {
        let replica = replica(1, &[2], catalog());

        assert!(matches!(
            replica.server_handle_propose_entry(proposal(2, entry(3, 1, "Tux"))).await,
            Err(ProposeEntryError::CatchUpFailed(_))
        ));
        assert_eq!(None, replica.status().await.last_index);
    }

    #[tokio::test]
    async fn order_number_needs_a_majority_of_persisted_copies() {
        let catalog = catalog();
        let replica = replica_with_scripted_peer(
            6301,
            ScriptedPeer {
                propose_reply: acked(),
                commit_reply: commit_failed(),
            },
            catalog.clone(),
        )
        .await;
        elect_self(&replica, 1).await;

        assert!(matches!(
            replica.handle_submit_order(order("Tux", 2)).await,
            Err(SubmitOrderError::CommitUnconfirmed {
                order_number: 1,
                acks: 1,
                required: 2
            })
        ));
        // The leader's own copy stays committed.
        assert_eq!(1, replica.status().await.last_order_number);
        assert_eq!(Some(8), catalog.quantity("Tux"));

        let replica = replica_with_scripted_peer(
            6302,
            ScriptedPeer {
                propose_reply: acked(),
                commit_reply: confirmed(),
            },
            catalog.clone(),
        )
        .await;
        elect_self(&replica, 1).await;

        let placed = replica.handle_submit_order(order("Tux", 2)).await.unwrap();
        assert_eq!(1, placed.order_number);
    }

    #[tokio::test]
    async fn leader_that_steps_down_mid_round_reports_leader_unknown() {
        let stale_term = proto_propose_entry_result::Result::Err(ProtoProposeEntryError {
            err: Some(proto_propose_entry_error::Err::StaleTerm(ProtoStaleTerm { current_term: 7 })),
        });
        let replica = replica_with_scripted_peer(
            6303,
            ScriptedPeer {
                propose_reply: stale_term,
                commit_reply: confirmed(),
            },
            catalog(),
        )
        .await;
        elect_self(&replica, 1).await;

        assert!(matches!(
            replica.handle_submit_order(order("Tux", 1)).await,
            Err(SubmitOrderError::LeaderUnknown)
        ));

        let status = replica.status().await;
        assert_eq!(Role::Follower, status.descriptor.role);
        assert_eq!(None, status.leader_id);
        assert_eq!(Term::new(7), status.descriptor.term);
        assert_eq!(None, status.last_index);
    }

    #[tokio::test]
    async fn commit_over_entry_from_another_term_is_not_persisted() {
        let replica = replica(1, &[2, 3], catalog());

        // Leader 2 on term 1 gets an entry to us, then leader 3 takes over on term 2.
        replica.server_handle_propose_entry(proposal(2, entry(1, 1, "Tux"))).await.unwrap();
        replica
            .server_handle_inform_leader(LeaderAnnouncement {
                leader_id: NodeId::new(3),
                term: Term::new(2),
            })
            .await
            .unwrap();

        // Same item and quantity, but leader 3's entry at index 1 is a different one. Node 3 is
        // unreachable, so catch-up fails rather than persisting over our term 1 entry.
        assert!(matches!(
            replica.server_handle_commit_record(commit(3, 1, &entry(1, 2, "Tux"))).await,
            Err(CommitRecordError::CatchUpFailed(_))
        ));

        let status = replica.status().await;
        assert_eq!(None, status.commit_index);
        assert_eq!(0, status.last_order_number);
        let fetched = replica.server_handle_fetch_entry(Index::new(1)).await.unwrap().unwrap();
        assert_eq!(Term::new(1), fetched.entry.term);
        assert!(fetched.committed_record.is_none());
    }

    #[tokio::test]
    async fn reads_proceed_while_a_reader_holds_state() {
        let replica = replica(1, &[], catalog());
        elect_self(&replica, 1).await;
        replica.handle_submit_order(order("Fox", 3)).await.unwrap();

        let _reader = replica.state.read().await;
        let record = tokio::time::timeout(Duration::from_millis(200), replica.handle_get_order(1))
            .await
            .expect("Lookup waited on another reader")
            .unwrap();
        assert_eq!(Some(3), record.map(|r| r.quantity));
    }

    #[tokio::test]
    async fn reads_proceed_during_a_replication_round() {
        let replica = replica(1, &[], catalog());
        elect_self(&replica, 1).await;
        replica.handle_submit_order(order("Fox", 3)).await.unwrap();

        let _gate = replica.replication_gate.lock().await;
        let record = tokio::time::timeout(Duration::from_millis(200), replica.handle_get_order(1))
            .await
            .expect("Lookup waited on the replication gate")
            .unwrap();
        assert_eq!(Some(3), record.map(|r| r.quantity));

        let fetched = tokio::time::timeout(Duration::from_millis(200), replica.server_handle_fetch_entry(Index::new(1)))
            .await
            .expect("Fetch waited on the replication gate")
            .unwrap();
        assert!(fetched.is_some());
    }
}
