use crate::replica::{MemberMetadata, NodeDescriptor, NodeId, OrderRecord, ReplicaStatus};
use std::net::Ipv4Addr;

#[derive(Clone, Debug)]
pub struct MemberInfo {
    pub node_id: NodeId,
    pub ip_addr: Ipv4Addr,
    pub rpc_port: u16,
}

impl From<&MemberInfo> for MemberMetadata {
    fn from(member_info: &MemberInfo) -> Self {
        MemberMetadata::new(member_info.node_id, member_info.ip_addr, member_info.rpc_port)
    }
}

/// A committed order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Order {
    pub order_number: u64,
    pub item_name: String,
    pub quantity: u64,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Order {
            order_number: record.order_number,
            item_name: record.item_name,
            quantity: record.quantity,
        }
    }
}

/// What a node currently believes about itself and the cluster. Index values of 0 mean "nothing
/// yet".
#[derive(Clone, Debug)]
pub struct NodeStatus {
    pub descriptor: NodeDescriptor,
    pub leader_id: Option<NodeId>,
    pub last_index: u64,
    pub commit_index: u64,
    pub last_order_number: u64,
}

impl From<ReplicaStatus> for NodeStatus {
    fn from(status: ReplicaStatus) -> Self {
        NodeStatus {
            descriptor: status.descriptor,
            leader_id: status.leader_id,
            last_index: status.last_index.map_or(0, |index| index.as_u64()),
            commit_index: status.commit_index.map_or(0, |index| index.as_u64()),
            last_order_number: status.last_order_number,
        }
    }
}
