//! This mod is meant to hold most of the code for the library's client-facing API.
mod client;
mod options;
mod types;
mod wiring;

pub use client::OrderClient;
pub use client::OrderClientError;
pub use client::OrderRejection;
pub use options::NodeOptions;
pub use types::MemberInfo;
pub use types::NodeStatus;
pub use types::Order;
pub use wiring::try_create_order_node;
pub use wiring::OrderNode;
pub use wiring::OrderNodeConfig;
pub use wiring::OrderNodeCreationError;
