use super::disseminator::{DisseminationReport, GossipDisseminator};
use super::failure_detector::FailureDetector;
use super::member::{Heartbeat, MemberStatus, NodeId};
use super::table::MembershipTable;
use crate::metrics::{self, TICK_HISTOGRAM};
use log::*;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// What one protocol tick did.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickReport {
    pub heartbeat: Option<Heartbeat>,
    pub dissemination: DisseminationReport,
    pub suspected: Vec<NodeId>,
    pub evicted: Vec<NodeId>,
}

/// Runs the gossip protocol period after period.
pub struct ProtocolScheduler {
    table: MembershipTable,
    disseminator: GossipDisseminator,
    detector: FailureDetector,
    protocol_period: Duration,
}

pub struct SchedulerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ProtocolScheduler {
    pub fn new(
        table: MembershipTable,
        disseminator: GossipDisseminator,
        detector: FailureDetector,
        protocol_period: Duration,
    ) -> Self {
        Self {
            table,
            disseminator,
            detector,
            protocol_period,
        }
    }

    /// Heartbeat, gossip, then sweep for suspects and the dead.
    pub async fn tick(&self) -> TickReport {
        let timer = TICK_HISTOGRAM.start_timer();
        let heartbeat = self.heartbeat();
        let snapshot = self.table.snapshot();
        let dissemination = self.disseminator.disseminate(&snapshot).await;
        let suspected = self.detector.detect_suspects(&self.table);
        let evicted = self.detector.evict_dead(&self.table);
        metrics::observe_members(&self.table.snapshot());
        timer.observe_duration();
        debug!(
            "Tick {:?}: gossiped to {}/{} peers, {} suspected, {} evicted",
            heartbeat,
            dissemination.reached.len(),
            dissemination.reached.len() + dissemination.failed.len(),
            suspected.len(),
            evicted.len()
        );
        TickReport {
            heartbeat,
            dissemination,
            suspected,
            evicted,
        }
    }

    fn heartbeat(&self) -> Option<Heartbeat> {
        let now = self.table.clock().now_secs();
        let result = self.table.apply_local_update(self.table.local_id().as_str(), |record| {
            record.heartbeat = record.heartbeat.saturating_add(1);
            record.last_updated_at = now;
            record.status = MemberStatus::Alive;
            record.heartbeat
        });
        match result {
            Ok(heartbeat) => Some(heartbeat),
            Err(err) => {
                warn!("Skipping self heartbeat: {}", err);
                None
            }
        }
    }

    /// Spawns the recurring tick on the current runtime.
    ///
    /// Ticks run one at a time; firings missed while a tick is still running
    /// are skipped. Stopping the handle abandons any tick in flight.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, mut receiver) = oneshot::channel();
        let task = tokio::spawn(async move {
            let mut interval = time::interval(self.protocol_period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "Gossiping as '{}' every {:?}, suspecting after {:?}, evicting after {:?}",
                self.table.local_id(),
                self.protocol_period,
                self.detector.suspicion_timeout(),
                self.detector.failure_timeout()
            );
            loop {
                tokio::select! {
                    _ = &mut receiver => break,
                    _ = interval.tick() => (),
                }
                tokio::select! {
                    _ = &mut receiver => break,
                    _ = self.tick() => (),
                }
            }
            info!("Stopped gossiping as '{}'", self.table.local_id());
        });
        SchedulerHandle { shutdown, task }
    }
}

impl SchedulerHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            warn!("Protocol scheduler ended abnormally: {}", err);
        }
    }
}
