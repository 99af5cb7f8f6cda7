use crate::replica::log_entry::Term;
use crate::replica::peer_client::PeerClient;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

/// NodeId identifies a member of the (static) cluster. Higher ids win elections.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Leader,
    Follower,
}

/// NodeDescriptor is a point-in-time view of one node: who it is, where it listens, and what it
/// believes its role and term are.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub address: String,
    pub role: Role,
    pub term: Term,
}

#[derive(Clone, Debug)]
pub(crate) struct MemberMetadata {
    node_id: NodeId,
    ip_addr: Ipv4Addr,
    rpc_port: u16,
}

impl MemberMetadata {
    pub(crate) fn new(node_id: NodeId, ip_addr: Ipv4Addr, rpc_port: u16) -> Self {
        MemberMetadata {
            node_id,
            ip_addr,
            rpc_port,
        }
    }

    pub(crate) fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub(crate) fn ip_addr(&self) -> Ipv4Addr {
        self.ip_addr
    }

    pub(crate) fn rpc_port(&self) -> u16 {
        self.rpc_port
    }

    pub(crate) fn address(&self) -> String {
        format!("{}:{}", self.ip_addr, self.rpc_port)
    }
}

#[derive(Clone)]
pub(crate) struct Peer {
    pub(crate) metadata: MemberMetadata,
    pub(crate) client: PeerClient,
}

impl Peer {
    pub(crate) fn node_id(&self) -> NodeId {
        self.metadata.node_id()
    }
}

/// ClusterTracker holds the static membership as seen from one node: itself plus a client for
/// every peer.
pub(crate) struct ClusterTracker {
    my_metadata: MemberMetadata,
    peers: HashMap<NodeId, Peer>,
}

impl ClusterTracker {
    pub(crate) fn new(my_metadata: MemberMetadata, peers: HashMap<NodeId, Peer>) -> Self {
        ClusterTracker { my_metadata, peers }
    }

    pub(crate) fn my_node_id(&self) -> NodeId {
        self.my_metadata.node_id()
    }

    pub(crate) fn my_metadata(&self) -> &MemberMetadata {
        &self.my_metadata
    }

    pub(crate) fn peer(&self, node_id: NodeId) -> Option<&Peer> {
        self.peers.get(&node_id)
    }

    pub(crate) fn iter_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub(crate) fn metadata(&self, node_id: NodeId) -> Option<&MemberMetadata> {
        if node_id == self.my_node_id() {
            Some(&self.my_metadata)
        } else {
            self.peers.get(&node_id).map(|peer| &peer.metadata)
        }
    }

    pub(crate) fn contains_member(&self, node_id: NodeId) -> bool {
        self.metadata(node_id).is_some()
    }

    /// Number of members, including me.
    pub(crate) fn num_members(&self) -> usize {
        self.peers.len() + 1
    }

    /// A strict majority of the full member set.
    pub(crate) fn majority(&self) -> usize {
        get_majority_count(self.num_members())
    }
}

pub(crate) fn get_majority_count(num_members: usize) -> usize {
    (num_members / 2) + 1
}
