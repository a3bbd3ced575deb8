use super::member::NodeId;
use super::table::MembershipTable;
use crate::clock::elapsed_since;
use crate::config::Config;
use log::*;
use std::time::Duration;

/// Marks every Alive member silent for at least `threshold_beats` protocol
/// periods as Suspected.
pub fn detect_suspects(
    table: &MembershipTable,
    threshold_beats: u32,
    protocol_period: Duration,
) -> Vec<NodeId> {
    let timeout = protocol_period * threshold_beats;
    let now = table.clock().now();
    let suspected = table.suspect_where(|record| elapsed_since(now, record.last_updated_at) >= timeout);
    for id in &suspected {
        debug!("Suspecting '{}' after {:?} of silence", id, timeout);
    }
    suspected
}

/// Removes every Suspected member silent for at least `threshold_beats`
/// protocol periods. The local member is never removed.
pub fn evict_dead(
    table: &MembershipTable,
    threshold_beats: u32,
    protocol_period: Duration,
) -> Vec<NodeId> {
    let timeout = protocol_period * threshold_beats;
    let now = table.clock().now();
    let evicted = table.evict_where(|record| elapsed_since(now, record.last_updated_at) >= timeout);
    for id in &evicted {
        debug!("Evicting '{}' after {:?} of silence", id, timeout);
    }
    let purged = table.purge_tombstones(timeout);
    if purged > 0 {
        debug!("Forgot {} tombstones", purged);
    }
    evicted
}

/// The detector thresholds a node runs with.
#[derive(Clone, Debug)]
pub struct FailureDetector {
    protocol_period: Duration,
    suspicion_threshold_beats: u32,
    failure_threshold_beats: u32,
}

impl FailureDetector {
    pub fn new(
        protocol_period: Duration,
        suspicion_threshold_beats: u32,
        failure_threshold_beats: u32,
    ) -> Self {
        Self {
            protocol_period,
            suspicion_threshold_beats,
            failure_threshold_beats,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.protocol_period(),
            config.suspicion_threshold_beats,
            config.failure_threshold_beats,
        )
    }

    pub fn suspicion_timeout(&self) -> Duration {
        self.protocol_period * self.suspicion_threshold_beats
    }

    pub fn failure_timeout(&self) -> Duration {
        self.protocol_period * self.failure_threshold_beats
    }

    pub fn detect_suspects(&self, table: &MembershipTable) -> Vec<NodeId> {
        detect_suspects(table, self.suspicion_threshold_beats, self.protocol_period)
    }

    pub fn evict_dead(&self, table: &MembershipTable) -> Vec<NodeId> {
        evict_dead(table, self.failure_threshold_beats, self.protocol_period)
    }
}
