mod api;
mod catalog;
mod commitlog;
mod election;
mod replica;
mod server;
mod grpc {
    include!("../generated/ordernode.rs");
}

pub use api::try_create_order_node;
pub use api::MemberInfo;
pub use api::NodeOptions;
pub use api::NodeStatus;
pub use api::Order;
pub use api::OrderClient;
pub use api::OrderClientError;
pub use api::OrderNode;
pub use api::OrderNodeConfig;
pub use api::OrderNodeCreationError;
pub use api::OrderRejection;
pub use catalog::Catalog;
pub use catalog::CatalogError;
pub use catalog::InMemoryCatalog;
pub use commitlog::Index;
pub use election::ElectionError;
pub use replica::ApplyError;
pub use replica::CatchUpError;
pub use replica::CatchUpOutcome;
pub use replica::EventKind;
pub use replica::LogEntry;
pub use replica::NodeDescriptor;
pub use replica::NodeId;
pub use replica::OrderPayload;
pub use replica::PeerError;
pub use replica::ReplicationLogError;
pub use replica::Role;
pub use replica::Term;
