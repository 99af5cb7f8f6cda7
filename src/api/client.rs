use crate::api::options::{NodeOptions, NodeOptionsValidated};
use crate::api::types::{MemberInfo, Order};
use crate::election::{Candidate, ElectionCoordinator, ElectionError};
use crate::grpc::{
    proto_get_order_result, proto_submit_order_error, proto_submit_order_result, ProtoGetOrderReq,
    ProtoGetOrderResult, ProtoSubmitOrderReq, ProtoSubmitOrderResult,
};
use crate::replica::{NodeId, OrderRecord, PeerClient, PeerError};
use std::collections::HashMap;
use std::convert::TryFrom;

/// Why the leader refused an order. Nothing was written for any of these.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum OrderRejection {
    #[error("Quantity must be greater than 0")]
    InvalidQuantity,
    #[error("Item is not in the catalog")]
    UnknownItem,
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },
    #[error("Replicated to {acks} of {required} required members")]
    QuorumNotReached { acks: u64, required: u64 },
    #[error("Node doesn't know who the leader is")]
    LeaderUnknown,
    #[error("Node isn't leader, {leader_id:?} at {leader_address} is")]
    NotLeader { leader_id: NodeId, leader_address: String },
    #[error("Server fault: {0}")]
    ServerFault(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OrderClientError {
    #[error("Illegal options for configuring client: {0}")]
    IllegalOptions(String),
    #[error("Invalid address for {0:?}")]
    InvalidAddress(NodeId),
    #[error("{0:?} appears more than once in cluster config")]
    DuplicateMember(NodeId),
    #[error("No leader available: {0}")]
    NoLeader(#[from] ElectionError),
    #[error("{0:?} is not a cluster member")]
    UnknownMember(NodeId),

    // The order may or may not have been placed.
    #[error("Lost contact with leader {0:?}: {1}")]
    LeaderUnreachable(NodeId, PeerError),
    #[error("Order rejected: {0}")]
    Rejected(OrderRejection),
    // The order was placed, but it may be lost if the leader fails before more members store it.
    #[error("Order {order_number} placed but confirmed by only {acks} of {required} required members")]
    CommitUnconfirmed { order_number: u64, acks: u64, required: u64 },
    #[error("Malformed reply from leader: {0}")]
    MalformedReply(&'static str),
}

/// OrderClient routes order requests to the cluster leader. It owns the election coordinator, so
/// it's also the thing that notices a dead leader and picks a new one.
pub struct OrderClient {
    logger: slog::Logger,
    coordinator: ElectionCoordinator,
    clients: HashMap<NodeId, PeerClient>,
}

impl OrderClient {
    pub fn new(
        logger: slog::Logger,
        cluster_members: Vec<MemberInfo>,
        options: NodeOptions,
    ) -> Result<Self, OrderClientError> {
        let options =
            NodeOptionsValidated::try_from(options).map_err(|e| OrderClientError::IllegalOptions(e.to_string()))?;

        let mut clients = HashMap::with_capacity(cluster_members.len());
        let mut candidates = Vec::with_capacity(cluster_members.len());
        for member_info in cluster_members {
            let node_id = member_info.node_id;
            if clients.contains_key(&node_id) {
                return Err(OrderClientError::DuplicateMember(node_id));
            }

            let client = PeerClient::new(member_info.ip_addr, member_info.rpc_port, options.peer_rpc_timeout)
                .map_err(|_| OrderClientError::InvalidAddress(node_id))?;
            let probe_client =
                PeerClient::new(member_info.ip_addr, member_info.rpc_port, options.election_probe_timeout)
                    .map_err(|_| OrderClientError::InvalidAddress(node_id))?;

            clients.insert(node_id, client);
            candidates.push(Candidate {
                node_id,
                client: probe_client,
            });
        }

        let coordinator = ElectionCoordinator::new(logger.new(slog::o!("Role" => "ElectionCoordinator")), candidates);

        Ok(OrderClient {
            logger,
            coordinator,
            clients,
        })
    }

    pub fn current_leader(&self) -> Option<NodeId> {
        self.coordinator.current_leader()
    }

    /// Runs an election now, regardless of whether a leader is known.
    pub async fn elect_leader(&mut self) -> Result<NodeId, OrderClientError> {
        Ok(self.coordinator.elect().await?)
    }

    /// Places an order and returns its order number.
    ///
    /// If the node we believed was leader says it isn't, nothing was written, so we re-elect and try
    /// once more. If the leader stops answering mid-call, or placed the order without a majority
    /// confirming it, we don't retry, since the order may have been placed.
    pub async fn submit_order(
        &mut self,
        item_name: impl Into<String>,
        quantity: i64,
    ) -> Result<u64, OrderClientError> {
        let item_name = item_name.into();
        let mut re_elected = false;

        loop {
            let (leader_id, client) = self.leader().await?;
            let rpc_request = ProtoSubmitOrderReq {
                item_name: item_name.clone(),
                quantity,
            };

            let rpc_reply = match client.submit_order(rpc_request).await {
                Ok(rpc_reply) => rpc_reply,
                Err(e) => {
                    self.replace_leader(leader_id, &e).await;
                    return Err(OrderClientError::LeaderUnreachable(leader_id, e));
                }
            };

            match Self::convert_submit_order_result(rpc_reply)? {
                Ok(order_number) => return Ok(order_number),
                Err(OrderRejection::NotLeader { .. }) | Err(OrderRejection::LeaderUnknown) if !re_elected => {
                    slog::info!(self.logger, "{:?} isn't leading. Re-running election.", leader_id);
                    self.coordinator.invalidate();
                    re_elected = true;
                }
                Err(rejection) => return Err(OrderClientError::Rejected(rejection)),
            }
        }
    }

    /// Looks up an order on the leader. Reads are safe to repeat, so a dead leader is replaced and
    /// the read retried once.
    pub async fn get_order(&mut self, order_number: u64) -> Result<Option<Order>, OrderClientError> {
        let mut retried = false;

        loop {
            let (leader_id, client) = self.leader().await?;

            match client.get_order(ProtoGetOrderReq { order_number }).await {
                Ok(rpc_reply) => return Self::convert_get_order_result(rpc_reply),
                Err(e) if !retried => {
                    self.replace_leader(leader_id, &e).await;
                    retried = true;
                }
                Err(e) => {
                    self.coordinator.invalidate();
                    return Err(OrderClientError::LeaderUnreachable(leader_id, e));
                }
            }
        }
    }

    async fn leader(&mut self) -> Result<(NodeId, PeerClient), OrderClientError> {
        let leader_id = match self.coordinator.current_leader() {
            Some(leader_id) => leader_id,
            None => self.coordinator.elect().await?,
        };

        match self.clients.get(&leader_id) {
            Some(client) => Ok((leader_id, client.clone())),
            None => Err(OrderClientError::UnknownMember(leader_id)),
        }
    }

    async fn replace_leader(&mut self, leader_id: NodeId, e: &PeerError) {
        slog::warn!(self.logger, "Leader {:?} unreachable: {}. Re-running election.", leader_id, e);
        self.coordinator.invalidate();
        if let Err(e) = self.coordinator.elect().await {
            slog::warn!(self.logger, "Re-election failed: {}", e);
        }
    }

    fn convert_submit_order_result(
        rpc_reply: ProtoSubmitOrderResult,
    ) -> Result<Result<u64, OrderRejection>, OrderClientError> {
        let err = match rpc_reply.result {
            Some(proto_submit_order_result::Result::Ok(placed)) => return Ok(Ok(placed.order_number)),
            Some(proto_submit_order_result::Result::Err(err)) => err.err,
            None => return Err(OrderClientError::MalformedReply("SubmitOrder result is empty")),
        };

        let rejection = match err {
            Some(proto_submit_order_error::Err::InvalidQuantity(_)) => OrderRejection::InvalidQuantity,
            Some(proto_submit_order_error::Err::UnknownItem(_)) => OrderRejection::UnknownItem,
            Some(proto_submit_order_error::Err::InsufficientStock(e)) => OrderRejection::InsufficientStock {
                requested: e.requested,
                available: e.available,
            },
            Some(proto_submit_order_error::Err::QuorumNotReached(e)) => OrderRejection::QuorumNotReached {
                acks: e.acks,
                required: e.required,
            },
            Some(proto_submit_order_error::Err::LeaderUnknown(_)) => OrderRejection::LeaderUnknown,
            Some(proto_submit_order_error::Err::NotLeader(e)) => OrderRejection::NotLeader {
                leader_id: NodeId::new(e.leader_id),
                leader_address: e.leader_address,
            },
            Some(proto_submit_order_error::Err::ServerFault(e)) => OrderRejection::ServerFault(e.message),
            Some(proto_submit_order_error::Err::CommitUnconfirmed(e)) => {
                return Err(OrderClientError::CommitUnconfirmed {
                    order_number: e.order_number,
                    acks: e.acks,
                    required: e.required,
                })
            }
            None => return Err(OrderClientError::MalformedReply("SubmitOrder error is empty")),
        };

        Ok(Err(rejection))
    }

    fn convert_get_order_result(rpc_reply: ProtoGetOrderResult) -> Result<Option<Order>, OrderClientError> {
        match rpc_reply.result {
            Some(proto_get_order_result::Result::Found(proto_record)) => OrderRecord::try_from(proto_record)
                .map(|record| Some(Order::from(record)))
                .map_err(OrderClientError::MalformedReply),
            Some(proto_get_order_result::Result::NotFound(_)) => Ok(None),
            None => Err(OrderClientError::MalformedReply("GetOrder result is empty")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OrderClient, OrderClientError, OrderRejection};
    use crate::api::options::NodeOptions;
    use crate::api::types::MemberInfo;
    use crate::election::ElectionError;
    use crate::grpc::{
        proto_submit_order_error, proto_submit_order_result, ProtoCommitUnconfirmed, ProtoInsufficientStock,
        ProtoSubmitOrderError, ProtoSubmitOrderResult,
    };
    use crate::replica::NodeId;
    use std::net::Ipv4Addr;
    use tokio::time::Duration;

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn member(id: u64) -> MemberInfo {
        MemberInfo {
            node_id: NodeId::new(id),
            ip_addr: Ipv4Addr::LOCALHOST,
            // Nothing listens here.
            rpc_port: 1 + id as u16,
        }
    }

    fn fast_options() -> NodeOptions {
        NodeOptions {
            peer_rpc_timeout: Some(Duration::from_millis(100)),
            election_probe_timeout: Some(Duration::from_millis(100)),
        }
    }

    #[test]
    fn rejects_duplicate_members() {
        let result = OrderClient::new(logger(), vec![member(1), member(1)], fast_options());
        assert!(matches!(result, Err(OrderClientError::DuplicateMember(_))));
    }

    #[test]
    fn decodes_rejections() {
        let rpc_reply = ProtoSubmitOrderResult {
            result: Some(proto_submit_order_result::Result::Err(ProtoSubmitOrderError {
                err: Some(proto_submit_order_error::Err::InsufficientStock(ProtoInsufficientStock {
                    requested: 20,
                    available: 5,
                })),
            })),
        };

        assert_eq!(
            Err(OrderRejection::InsufficientStock {
                requested: 20,
                available: 5
            }),
            OrderClient::convert_submit_order_result(rpc_reply).unwrap()
        );
        assert!(OrderClient::convert_submit_order_result(ProtoSubmitOrderResult { result: None }).is_err());
    }

    #[test]
    fn unconfirmed_commit_is_not_a_rejection() {
        let rpc_reply = ProtoSubmitOrderResult {
            result: Some(proto_submit_order_result::Result::Err(ProtoSubmitOrderError {
                err: Some(proto_submit_order_error::Err::CommitUnconfirmed(ProtoCommitUnconfirmed {
                    order_number: 4,
                    acks: 1,
                    required: 2,
                })),
            })),
        };

        assert!(matches!(
            OrderClient::convert_submit_order_result(rpc_reply),
            Err(OrderClientError::CommitUnconfirmed {
                order_number: 4,
                acks: 1,
                required: 2
            })
        ));
    }

    #[tokio::test]
    async fn unreachable_cluster_has_no_leader() {
        let mut client = OrderClient::new(logger(), vec![member(1), member(2), member(3)], fast_options()).unwrap();

        assert!(matches!(
            client.submit_order("Tux", 1).await,
            Err(OrderClientError::NoLeader(ElectionError::NoReachableCandidate))
        ));
        assert_eq!(None, client.current_leader());
    }
}
