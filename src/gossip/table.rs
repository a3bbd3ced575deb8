use super::member::{Heartbeat, MemberRecord, MemberStatus, MembershipEvent, NodeId};
use crate::clock::{Clock, Timestamp};
use crate::error::MembershipError;
use crate::event_emitter::EventEmitter;
use crate::metrics::{DETECTOR_COUNTER, MERGE_COUNTER};
use crate::proto::GossipEntry;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeOutcome {
    /// First mention of the node; inserted as Alive.
    Inserted,
    /// Strictly fresher on both heartbeat and timestamp; accepted.
    Updated,
    /// Not provably fresher, or about the local node; the record is
    /// unchanged.
    Rejected,
    /// The node was evicted and the entry is no newer than its tombstone.
    Buried,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub updated: usize,
    pub rejected: usize,
    pub buried: usize,
}

impl MergeSummary {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Updated => self.updated += 1,
            MergeOutcome::Rejected => self.rejected += 1,
            MergeOutcome::Buried => self.buried += 1,
        }
    }

    pub fn accepted(&self) -> usize {
        self.inserted + self.updated
    }
}

/// The membership view of one node.
///
/// Cloning yields another handle to the same table. Every operation takes the
/// table lock for its whole duration, so each one is atomic with respect to
/// all others, including `merge_batch` against `snapshot`.
#[derive(Clone)]
pub struct MembershipTable {
    local_id: NodeId,
    clock: Clock,
    inner: Arc<RwLock<InnerMembershipTable>>,
}

struct InnerMembershipTable {
    members: HashMap<NodeId, MemberRecord>,
    graveyard: HashMap<NodeId, Tombstone>,
    event_emitter: EventEmitter<MembershipEvent>,
}

struct Tombstone {
    heartbeat: Heartbeat,
    evicted_at: Duration,
}

impl MembershipTable {
    pub fn new(local_id: NodeId, clock: Clock) -> Self {
        let inner = InnerMembershipTable {
            members: HashMap::new(),
            graveyard: HashMap::new(),
            event_emitter: EventEmitter::new(64),
        };
        Self {
            local_id,
            clock,
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn subscribe(&self) -> tokio::sync::mpsc::Receiver<MembershipEvent> {
        self.write().event_emitter.subscribe()
    }

    /// Inserts an Alive record unless one already exists for `id`.
    pub fn seed(&self, id: NodeId, heartbeat: Heartbeat, timestamp: Timestamp) -> bool {
        let mut locked = self.write();
        if locked.members.contains_key(&id) {
            return false;
        }
        locked.graveyard.remove(&id);
        let record = MemberRecord::new(id.clone(), heartbeat, timestamp);
        locked.members.insert(id, record);
        true
    }

    /// Copies every record out of the table, ordered by id.
    pub fn snapshot(&self) -> Vec<MemberRecord> {
        let mut records: Vec<MemberRecord> = self.read().members.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn get(&self, id: &str) -> Option<MemberRecord> {
        self.read().members.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every member id, sorted.
    pub fn member_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.read().members.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Mutates the record for `id` in place.
    ///
    /// The mutation cannot rename the record or lower its heartbeat; either
    /// change is reverted. Unknown ids leave the table untouched.
    pub fn apply_local_update<F, R>(&self, id: &str, f: F) -> Result<R, MembershipError>
    where
        F: FnOnce(&mut MemberRecord) -> R,
    {
        let mut locked = self.write();
        let record = locked
            .members
            .get_mut(id)
            .ok_or_else(|| MembershipError::UnknownNode(NodeId::new(id)))?;
        let heartbeat = record.heartbeat;
        let result = f(record);
        record.id = NodeId::new(id);
        record.heartbeat = record.heartbeat.max(heartbeat);
        Ok(result)
    }

    pub fn merge_one(&self, id: NodeId, heartbeat: Heartbeat, timestamp: Timestamp) -> MergeOutcome {
        let now = self.clock.now_secs();
        self.write().merge_one(&self.local_id, id, heartbeat, timestamp, now)
    }

    /// Merges a whole snapshot under a single lock acquisition.
    pub fn merge_batch<I>(&self, entries: I) -> MergeSummary
    where
        I: IntoIterator<Item = GossipEntry>,
    {
        let now = self.clock.now_secs();
        let mut locked = self.write();
        let mut summary = MergeSummary::default();
        for entry in entries {
            let outcome = locked.merge_one(
                &self.local_id,
                entry.id,
                entry.last_heartbeat,
                entry.last_timestamp,
                now,
            );
            summary.record(outcome);
        }
        summary
    }

    /// Promotes every Alive record matching `predicate` to Suspected. The
    /// local node is never suspected.
    pub fn suspect_where<P>(&self, predicate: P) -> Vec<NodeId>
    where
        P: Fn(&MemberRecord) -> bool,
    {
        let local_id = &self.local_id;
        let mut locked = self.write();
        let suspected: Vec<NodeId> = locked
            .members
            .values_mut()
            .filter(|record| record.id != *local_id)
            .filter(|record| record.status == MemberStatus::Alive && predicate(&**record))
            .map(|record| {
                record.status = MemberStatus::Suspected;
                record.id.clone()
            })
            .collect();
        for id in &suspected {
            DETECTOR_COUNTER.with_label_values(&["suspected"]).inc();
            locked.event_emitter.emit(MembershipEvent::Suspected(id.clone()));
        }
        suspected
    }

    /// Removes every Suspected record matching `predicate`, leaving a
    /// tombstone behind. The local node is never removed.
    pub fn evict_where<P>(&self, predicate: P) -> Vec<NodeId>
    where
        P: Fn(&MemberRecord) -> bool,
    {
        let evicted_at = self.clock.now();
        let mut locked = self.write();
        let doomed: Vec<NodeId> = locked
            .members
            .values()
            .filter(|record| record.id != self.local_id)
            .filter(|record| record.status == MemberStatus::Suspected && predicate(*record))
            .map(|record| record.id.clone())
            .collect();
        for id in &doomed {
            if let Some(record) = locked.members.remove(id) {
                let tombstone = Tombstone {
                    heartbeat: record.heartbeat,
                    evicted_at,
                };
                locked.graveyard.insert(record.id, tombstone);
            }
            DETECTOR_COUNTER.with_label_values(&["evicted"]).inc();
            locked.event_emitter.emit(MembershipEvent::Evicted(id.clone()));
        }
        doomed
    }

    /// Forgets tombstones older than `retention`, returning how many went.
    pub fn purge_tombstones(&self, retention: Duration) -> usize {
        let now = self.clock.now();
        let mut locked = self.write();
        let before = locked.graveyard.len();
        locked
            .graveyard
            .retain(|_, tombstone| now.saturating_sub(tombstone.evicted_at) < retention);
        before - locked.graveyard.len()
    }

    #[cfg(test)]
    pub fn is_buried(&self, id: &str) -> bool {
        self.read().graveyard.contains_key(id)
    }

    fn read(&self) -> RwLockReadGuard<'_, InnerMembershipTable> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InnerMembershipTable> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InnerMembershipTable {
    /// Only the owner advances its own heartbeat, so entries about
    /// `local_id` are always rejected.
    fn merge_one(
        &mut self,
        local_id: &NodeId,
        id: NodeId,
        heartbeat: Heartbeat,
        timestamp: Timestamp,
        now: Timestamp,
    ) -> MergeOutcome {
        let outcome = if id == *local_id {
            MergeOutcome::Rejected
        } else {
            self.merge_remote(id, heartbeat, timestamp, now)
        };
        MERGE_COUNTER
            .with_label_values(&[outcome.label()])
            .inc();
        outcome
    }

    fn merge_remote(
        &mut self,
        id: NodeId,
        heartbeat: Heartbeat,
        timestamp: Timestamp,
        now: Timestamp,
    ) -> MergeOutcome {
        match self.members.get_mut(&id) {
            Some(current) => {
                if timestamp > current.last_updated_at && heartbeat > current.heartbeat {
                    current.heartbeat = heartbeat;
                    current.last_updated_at = now;
                    if current.status == MemberStatus::Suspected {
                        current.status = MemberStatus::Alive;
                        DETECTOR_COUNTER.with_label_values(&["recovered"]).inc();
                        self.event_emitter.emit(MembershipEvent::Recovered(id));
                    }
                    MergeOutcome::Updated
                } else {
                    MergeOutcome::Rejected
                }
            }
            None => match self.graveyard.get(&id) {
                Some(tombstone) if heartbeat <= tombstone.heartbeat => MergeOutcome::Buried,
                _ => {
                    self.graveyard.remove(&id);
                    self.members
                        .insert(id.clone(), MemberRecord::new(id.clone(), heartbeat, now));
                    self.event_emitter.emit(MembershipEvent::Joined(id));
                    MergeOutcome::Inserted
                }
            },
        }
    }
}

impl MergeOutcome {
    fn label(self) -> &'static str {
        match self {
            MergeOutcome::Inserted => "inserted",
            MergeOutcome::Updated => "updated",
            MergeOutcome::Rejected => "rejected",
            MergeOutcome::Buried => "buried",
        }
    }
}
