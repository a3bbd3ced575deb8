use super::member::{MemberRecord, NodeId};
use super::table::MembershipTable;
use crate::metrics::GOSSIP_PUSH_COUNTER;
use crate::proto::GossipEntry;
use async_trait::async_trait;
use failure::{format_err, Error};
use futures::future;
use log::*;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Carries one snapshot to one peer.
#[async_trait]
pub trait GossipTransport: Send + Sync {
    async fn push(&self, peer: &NodeId, entries: &[GossipEntry]) -> Result<(), Error>;
}

/// Which peers a dissemination round reached.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DisseminationReport {
    pub reached: Vec<NodeId>,
    pub failed: Vec<NodeId>,
}

#[derive(Clone)]
pub struct GossipDisseminator {
    table: MembershipTable,
    transport: Arc<dyn GossipTransport>,
    fanout: usize,
    push_timeout: Duration,
}

impl GossipDisseminator {
    pub fn new(
        table: MembershipTable,
        transport: Arc<dyn GossipTransport>,
        fanout: usize,
        push_timeout: Duration,
    ) -> Self {
        Self {
            table,
            transport,
            fanout,
            push_timeout,
        }
    }

    /// Up to `n` distinct members, uniformly at random, none of them in
    /// `exclude`.
    pub fn choose_peers(&self, n: usize, exclude: &[NodeId]) -> Vec<NodeId> {
        let candidates: Vec<NodeId> = self
            .table
            .member_ids()
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .collect();
        candidates
            .choose_multiple(&mut rand::thread_rng(), n)
            .cloned()
            .collect()
    }

    /// Pushes `snapshot` to `fanout` random peers concurrently.
    ///
    /// Failed pushes are logged and reported, never returned as errors: the
    /// next tick is the only retry.
    pub async fn disseminate(&self, snapshot: &[MemberRecord]) -> DisseminationReport {
        let peers = self.choose_peers(self.fanout, std::slice::from_ref(self.table.local_id()));
        let mut report = DisseminationReport::default();
        if peers.is_empty() {
            debug!("No peers to gossip with");
            return report;
        }

        let entries: Vec<GossipEntry> = snapshot.iter().map(GossipEntry::from).collect();
        let pushes = peers.into_iter().map(|peer| {
            let entries = &entries;
            async move {
                let result = self.push(&peer, entries).await;
                (peer, result)
            }
        });
        for (peer, result) in future::join_all(pushes).await {
            match result {
                Ok(()) => {
                    GOSSIP_PUSH_COUNTER.with_label_values(&["ok"]).inc();
                    report.reached.push(peer);
                }
                Err(err) => {
                    GOSSIP_PUSH_COUNTER.with_label_values(&["error"]).inc();
                    debug!("Gossip to '{}' failed: {}", peer, err);
                    report.failed.push(peer);
                }
            }
        }
        report
    }

    async fn push(&self, peer: &NodeId, entries: &[GossipEntry]) -> Result<(), Error> {
        match time::timeout(self.push_timeout, self.transport.push(peer, entries)).await {
            Ok(result) => result,
            Err(_) => Err(format_err!("timed out after {:?}", self.push_timeout)),
        }
    }
}
