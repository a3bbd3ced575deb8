use super::table::{MembershipTable, MergeSummary};
use crate::error::MembershipError;
use crate::metrics::MALFORMED_ENTRY_COUNTER;
use crate::proto::GossipEntry;
use log::*;
use serde_json::Value;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReceiveReport {
    pub merged: MergeSummary,
    pub skipped: usize,
}

/// Merges snapshots pushed by peers into the local table.
///
/// The body must be a JSON array. Entries inside it that cannot be decoded
/// are skipped with a warning; the rest of the batch is still merged.
#[derive(Clone)]
pub struct GossipReceiver {
    table: MembershipTable,
}

impl GossipReceiver {
    pub fn new(table: MembershipTable) -> Self {
        Self { table }
    }

    pub fn receive(&self, body: &[u8]) -> Result<ReceiveReport, MembershipError> {
        let payload: Value = serde_json::from_slice(body)
            .map_err(|err| MembershipError::MalformedPayload(format!("invalid JSON: {}", err)))?;
        match payload {
            Value::Array(items) => Ok(self.receive_entries(items)),
            _ => Err(MembershipError::MalformedPayload(
                "expected a list of entries".to_string(),
            )),
        }
    }

    pub fn receive_entries(&self, items: Vec<Value>) -> ReceiveReport {
        let mut skipped = 0;
        let entries: Vec<GossipEntry> = items
            .into_iter()
            .filter_map(|item| match decode_entry(item) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping gossip entry: {}", err);
                    MALFORMED_ENTRY_COUNTER.inc();
                    skipped += 1;
                    None
                }
            })
            .collect();
        let merged = self.table.merge_batch(entries);
        debug!(
            "Merged gossip: {} inserted, {} updated, {} rejected, {} skipped",
            merged.inserted, merged.updated, merged.rejected, skipped
        );
        ReceiveReport { merged, skipped }
    }
}

fn decode_entry(item: Value) -> Result<GossipEntry, MembershipError> {
    let entry: GossipEntry = serde_json::from_value(item)
        .map_err(|err| MembershipError::MalformedPayload(err.to_string()))?;
    if entry.id.is_empty() {
        return Err(MembershipError::MalformedPayload("empty node id".to_string()));
    }
    Ok(entry)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clock::Clock;
    use crate::gossip::MemberStatus;
    use std::time::Duration;

    fn receiver() -> (MembershipTable, GossipReceiver) {
        let table = MembershipTable::new("self:1".into(), Clock::manual(Duration::from_secs(100)));
        table.seed("self:1".into(), 0, 100);
        (table.clone(), GossipReceiver::new(table))
    }

    #[test]
    fn test_receive_merges_batch() {
        let (table, receiver) = receiver();
        let body = br#"[
            {"id": "a:1", "last_heartbeat": 4, "last_timestamp": 90},
            {"id": "b:1", "last_heartbeat": 1, "last_timestamp": 95}
        ]"#;
        let report = receiver.receive(body).unwrap();
        assert_eq!(report.merged.inserted, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(table.get("a:1").unwrap().heartbeat, 4);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_rejects_non_list_payloads() {
        let (table, receiver) = receiver();
        for body in &[&b"not json"[..], b"{\"id\": \"a:1\"}", b"42", b""] {
            match receiver.receive(body) {
                Err(MembershipError::MalformedPayload(_)) => (),
                other => panic!("expected malformed payload, got {:?}", other),
            }
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_skips_malformed_entries() {
        let (table, receiver) = receiver();
        let body = br#"[
            {"id": "a:1", "last_heartbeat": 4, "last_timestamp": 90},
            {"id": "b:1", "last_heartbeat": "four", "last_timestamp": 90},
            {"id": "c:1", "last_timestamp": 90},
            {"id": "", "last_heartbeat": 1, "last_timestamp": 90},
            "d:1",
            {"id": "e:1", "last_heartbeat": 2, "last_timestamp": 90}
        ]"#;
        let report = receiver.receive(body).unwrap();
        assert_eq!(report.skipped, 4);
        assert_eq!(report.merged.inserted, 2);
        assert!(table.contains("a:1"));
        assert!(table.contains("e:1"));
        assert!(!table.contains("b:1"));
        assert!(!table.contains("c:1"));
    }

    #[test]
    fn test_wire_status_is_ignored() {
        let (table, receiver) = receiver();
        let body = br#"[{"id": "a:1", "last_heartbeat": 1, "last_timestamp": 1, "status": "suspected"}]"#;
        receiver.receive(body).unwrap();
        assert_eq!(table.get("a:1").unwrap().status, MemberStatus::Alive);
    }

    #[test]
    fn test_empty_list_is_accepted() {
        let (table, receiver) = receiver();
        let report = receiver.receive(b"[]").unwrap();
        assert_eq!(report, ReceiveReport::default());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_entries_about_the_local_node_are_rejected() {
        let (table, receiver) = receiver();
        let body = br#"[
            {"id": "self:1", "last_heartbeat": 18446744073709551615, "last_timestamp": 4000000000},
            {"id": "a:1", "last_heartbeat": 1, "last_timestamp": 90}
        ]"#;
        let report = receiver.receive(body).unwrap();
        assert_eq!(report.merged.rejected, 1);
        assert_eq!(report.merged.inserted, 1);
        let me = table.get("self:1").unwrap();
        assert_eq!(me.heartbeat, 0);
        assert_eq!(me.last_updated_at, 100);
    }
}
