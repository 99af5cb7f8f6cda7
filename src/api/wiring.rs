use crate::api::options::{NodeOptions, NodeOptionsValidated};
use crate::api::types::{MemberInfo, NodeStatus, Order};
use crate::catalog::Catalog;
use crate::commitlog::{FileLog, InMemoryLog, Log};
use crate::replica::{
    ApplyError, CatchUpError, CatchUpOutcome, ClusterTracker, LogEntry, MemberMetadata, NodeId, OrderRecord,
    OrderStateMachine, Peer, PeerClient, Replica, ReplicaConfig, ReplicationLog, ReplicationLogError,
};
use crate::server::{self, RpcServer, RpcServerShutdownHandle};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::sync::Arc;

type DynLog<E> = Box<dyn Log<E> + Send + Sync>;
type NodeReplica = Replica<DynLog<LogEntry>, DynLog<OrderRecord>>;

pub struct OrderNodeConfig {
    pub my_node_id: NodeId,
    pub cluster_members: Vec<MemberInfo>,
    // Where `replication.log` and `orders.log` live. Without one the node keeps everything in
    // memory and forgets it on restart.
    pub data_directory: Option<PathBuf>,
    pub catalog: Arc<dyn Catalog>,
    pub info_logger: slog::Logger,
    pub options: NodeOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderNodeCreationError {
    #[error("My node ID not in cluster config")]
    MeNotInCluster,
    #[error("{0:?} appears more than once in cluster config")]
    DuplicateMember(NodeId),
    #[error("Illegal options for configuring node: {0}")]
    IllegalOptions(String),
    #[error("Log initialization failure: {0}")]
    LogInitialization(io::Error),
    #[error("Invalid address for {0:?}")]
    InvalidAddress(NodeId),
}

/// OrderNode is a running node: its replica plus the gRPC server in front of it. Dropping it
/// stops the server.
pub struct OrderNode {
    replica: Arc<NodeReplica>,
    server_shutdown: RpcServerShutdownHandle,
}

impl OrderNode {
    /// Stops serving RPCs. To the rest of the cluster the node is gone, but its own state can still
    /// be read through this handle.
    pub fn stop(&mut self) {
        self.server_shutdown.shutdown();
    }

    pub fn node_id(&self) -> NodeId {
        self.replica.my_node_id()
    }

    pub async fn status(&self) -> NodeStatus {
        self.replica.status().await.into()
    }

    /// Every entry in this node's replication log, oldest first.
    pub async fn log_entries(&self) -> Result<Vec<LogEntry>, ReplicationLogError> {
        self.replica.log_entries().await
    }

    /// Looks up an order in this node's own table, without going through the leader.
    pub async fn get_order(&self, order_number: u64) -> Result<Option<Order>, io::Error> {
        Ok(self.replica.handle_get_order(order_number).await?.map(Order::from))
    }

    /// Catches up with the leader this node currently believes in, if it's behind.
    pub async fn sync_with_leader(&self) -> Result<CatchUpOutcome, CatchUpError> {
        self.replica.sync_with_leader().await
    }
}

pub async fn try_create_order_node(config: OrderNodeConfig) -> Result<OrderNode, OrderNodeCreationError> {
    let options = NodeOptionsValidated::try_from(config.options)
        .map_err(|e| OrderNodeCreationError::IllegalOptions(e.to_string()))?;

    let my_member_info = my_info(config.my_node_id, &config.cluster_members)?;
    let my_server_addr = rpc_server_addr(my_member_info);
    let logger = config
        .info_logger
        .new(slog::o!("NodeId" => config.my_node_id.as_u64()));

    let mut peers = HashMap::with_capacity(config.cluster_members.len());
    for member_info in config.cluster_members.iter() {
        if member_info.node_id == config.my_node_id {
            continue;
        }
        let client = PeerClient::new(member_info.ip_addr, member_info.rpc_port, options.peer_rpc_timeout)
            .map_err(|_| OrderNodeCreationError::InvalidAddress(member_info.node_id))?;
        let peer = Peer {
            metadata: MemberMetadata::from(member_info),
            client,
        };
        peers.insert(member_info.node_id, peer);
    }
    let cluster_tracker = ClusterTracker::new(MemberMetadata::from(my_member_info), peers);

    let (entries, records) =
        open_logs(&logger, config.data_directory.as_deref()).map_err(OrderNodeCreationError::LogInitialization)?;
    let log = ReplicationLog::open(logger.clone(), entries)
        .map_err(|e| OrderNodeCreationError::LogInitialization(replication_log_io_error(e)))?;
    let orders = OrderStateMachine::open(logger.clone(), records, config.catalog.clone())
        .map_err(|e| OrderNodeCreationError::LogInitialization(apply_io_error(e)))?;

    let replica = Arc::new(Replica::new(ReplicaConfig {
        logger: logger.clone(),
        cluster_tracker,
        log,
        orders,
        catalog: config.catalog,
    }));

    let (server_shutdown_handle, server_shutdown_signal) = server::shutdown_signal();
    let rpc_server = RpcServer::new(logger, replica.clone());
    tokio::spawn(rpc_server.run(my_server_addr, server_shutdown_signal));

    Ok(OrderNode {
        replica,
        server_shutdown: server_shutdown_handle,
    })
}

fn my_info(my_node_id: NodeId, cluster_members: &[MemberInfo]) -> Result<&MemberInfo, OrderNodeCreationError> {
    let mut me = None;
    for (i, member_info) in cluster_members.iter().enumerate() {
        if cluster_members[..i].iter().any(|m| m.node_id == member_info.node_id) {
            return Err(OrderNodeCreationError::DuplicateMember(member_info.node_id));
        }
        if member_info.node_id == my_node_id {
            me = Some(member_info);
        }
    }

    me.ok_or(OrderNodeCreationError::MeNotInCluster)
}

fn rpc_server_addr(member_info: &MemberInfo) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(member_info.ip_addr, member_info.rpc_port))
}

fn open_logs(
    logger: &slog::Logger,
    data_directory: Option<&Path>,
) -> Result<(DynLog<LogEntry>, DynLog<OrderRecord>), io::Error> {
    let entries: DynLog<LogEntry>;
    let records: DynLog<OrderRecord>;
    match data_directory {
        None => {
            entries = Box::new(InMemoryLog::<LogEntry>::create()?);
            records = Box::new(InMemoryLog::<OrderRecord>::create()?);
        }
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            entries = Box::new(FileLog::<LogEntry>::open(logger.clone(), directory.join("replication.log"))?);
            records = Box::new(FileLog::<OrderRecord>::open(logger.clone(), directory.join("orders.log"))?);
        }
    }

    Ok((entries, records))
}

fn replication_log_io_error(e: ReplicationLogError) -> io::Error {
    match e {
        ReplicationLogError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

fn apply_io_error(e: ApplyError) -> io::Error {
    match e {
        ApplyError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{my_info, OrderNodeCreationError};
    use crate::api::types::MemberInfo;
    use crate::replica::NodeId;
    use std::net::Ipv4Addr;

    fn member(id: u64) -> MemberInfo {
        MemberInfo {
            node_id: NodeId::new(id),
            ip_addr: Ipv4Addr::LOCALHOST,
            rpc_port: 7000 + id as u16,
        }
    }

    #[test]
    fn finds_me_in_cluster() {
        let members = vec![member(1), member(2), member(3)];
        assert_eq!(7002, my_info(NodeId::new(2), &members).unwrap().rpc_port);
    }

    #[test]
    fn rejects_bad_cluster_config() {
        let members = vec![member(1), member(2)];
        assert!(matches!(
            my_info(NodeId::new(3), &members),
            Err(OrderNodeCreationError::MeNotInCluster)
        ));

        let members = vec![member(1), member(2), member(1)];
        assert!(matches!(
            my_info(NodeId::new(2), &members),
            Err(OrderNodeCreationError::DuplicateMember(id)) if id == NodeId::new(1)
        ));
    }
}
