use order_replication::{
    InMemoryCatalog, MemberInfo, NodeId, NodeOptions, OrderClient, OrderNode, OrderNodeConfig,
};
use slog::Drain;
use std::error::Error;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::time::Duration;

const NUM_NODES: u64 = 3;
const PORT_BASE: u16 = 7100;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let logger = create_root_logger_for_stdout();
    let catalog = Arc::new(InMemoryCatalog::new(vec![("Tux", 10), ("Fox", 3), ("Whale", 0)]));

    let mut nodes: Vec<OrderNode> = Vec::new();
    for id in 1..=NUM_NODES {
        let node = order_replication::try_create_order_node(OrderNodeConfig {
            my_node_id: NodeId::new(id),
            cluster_members: cluster_members(),
            data_directory: None,
            catalog: catalog.clone(),
            info_logger: logger.clone(),
            options: NodeOptions::default(),
        })
        .await?;
        nodes.push(node);
    }

    // Give the servers a moment to bind.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut client = OrderClient::new(logger.clone(), cluster_members(), NodeOptions::default())?;
    let leader_id = client.elect_leader().await?;
    slog::info!(logger, "Leader is {:?}", leader_id);

    for (item_name, quantity) in vec![("Tux", 5), ("Tux", 20), ("Fox", 1), ("Whale", 1), ("Dragon", 1)] {
        match client.submit_order(item_name, quantity).await {
            Ok(order_number) => slog::info!(logger, "Placed {} x {} as order {}", quantity, item_name, order_number),
            Err(e) => slog::info!(logger, "Order for {} x {} failed: {}", quantity, item_name, e),
        }
    }

    // Lose the leader and keep going.
    nodes.retain(|node| node.node_id() != leader_id);
    tokio::time::sleep(Duration::from_millis(200)).await;
    match client.submit_order("Fox", 1).await {
        Ok(order_number) => slog::info!(logger, "Placed order {} after losing the leader", order_number),
        Err(e) => {
            slog::info!(logger, "Order failed after losing the leader: {}", e);
            let order_number = client.submit_order("Fox", 1).await?;
            slog::info!(logger, "Placed order {} with new leader {:?}", order_number, client.current_leader());
        }
    }

    for node in nodes.iter() {
        let status = node.status().await;
        slog::info!(
            logger,
            "{:?}: role {:?}, term {:?}, last index {}, last order {}",
            status.descriptor.id,
            status.descriptor.role,
            status.descriptor.term,
            status.last_index,
            status.last_order_number
        );
    }

    if let Some(order) = client.get_order(1).await? {
        slog::info!(logger, "Order 1 is {} x {}", order.quantity, order.item_name);
    }

    Ok(())
}

fn cluster_members() -> Vec<MemberInfo> {
    (1..=NUM_NODES)
        .map(|id| MemberInfo {
            node_id: NodeId::new(id),
            ip_addr: Ipv4Addr::LOCALHOST,
            rpc_port: PORT_BASE + id as u16,
        })
        .collect()
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
