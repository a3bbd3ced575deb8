use crate::action_executor::ActionExecutor;
use crate::clock::Clock;
use crate::config::Config;
use crate::gossip::{
    FailureDetector, GossipDisseminator, GossipTransport, MembershipEvent, MembershipTable,
    ProtocolScheduler,
};
use crate::rpc_client::RpcClient;
use crate::web::start_web;
use failure::Error;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc;

pub fn run(config: &Config) -> Result<(), Error> {
    actix_web::rt::System::new().block_on(run_system(config))
}

/// Runs a node until the web server stops, normally on SIGINT or SIGTERM.
pub async fn run_system(config: &Config) -> Result<(), Error> {
    let table = bootstrap_table(config, Clock::new());
    spawn_event_logger(table.subscribe());
    let transport = Arc::new(RpcClient::new(config.push_timeout())?);
    let scheduler = build_scheduler(config, table.clone(), transport).start();
    let server = start_web(config, ActionExecutor::new(table))?;
    info!(
        "Node '{}' started with {} seed peers",
        config.node_id(),
        config.peer_ids().len()
    );

    let result = server.await;
    scheduler.stop().await;
    info!("Node '{}' stopped", config.node_id());
    result.map_err(Error::from)
}

/// A fresh table holding this node and its seed peers at heartbeat 0.
pub fn bootstrap_table(config: &Config, clock: Clock) -> MembershipTable {
    let table = MembershipTable::new(config.node_id(), clock);
    let now = table.clock().now_secs();
    table.seed(config.node_id(), 0, now);
    config.peer_ids().into_iter().for_each(|peer| {
        table.seed(peer, 0, now);
    });
    table
}

pub fn build_scheduler(
    config: &Config,
    table: MembershipTable,
    transport: Arc<dyn GossipTransport>,
) -> ProtocolScheduler {
    let disseminator = GossipDisseminator::new(
        table.clone(),
        transport,
        config.fanout,
        config.push_timeout(),
    );
    ProtocolScheduler::new(
        table,
        disseminator,
        FailureDetector::from_config(config),
        config.protocol_period(),
    )
}

fn spawn_event_logger(mut events: mpsc::Receiver<MembershipEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                MembershipEvent::Joined(id) => info!("Member joined: {}", id),
                MembershipEvent::Suspected(id) => info!("Member suspected: {}", id),
                MembershipEvent::Recovered(id) => info!("Member recovered: {}", id),
                MembershipEvent::Evicted(id) => info!("Member evicted: {}", id),
            }
        }
    });
}
