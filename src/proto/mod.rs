//! JSON messages exchanged between nodes and with tooling.

use crate::clock::Timestamp;
use crate::gossip::{Heartbeat, MemberRecord, MemberStatus, NodeId};
use serde::{Deserialize, Serialize};

/// One entry of a pushed snapshot. Status is never part of a push; any
/// `status` field a sender includes is ignored.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GossipEntry {
    pub id: NodeId,
    pub last_heartbeat: Heartbeat,
    pub last_timestamp: Timestamp,
}

/// One row of the `/members` listing.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemberView {
    pub id: NodeId,
    pub last_heartbeat: Heartbeat,
    pub last_timestamp: Timestamp,
    pub status: MemberStatus,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PingResponse {
    pub response: String,
    pub node_id: NodeId,
}

impl PingResponse {
    pub fn pong(node_id: NodeId) -> Self {
        Self {
            response: "pong".to_string(),
            node_id,
        }
    }
}

/// Empty acknowledgement, serialized as `{}`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Ack {}

impl GossipEntry {
    pub fn new<I: Into<NodeId>>(id: I, last_heartbeat: Heartbeat, last_timestamp: Timestamp) -> Self {
        Self {
            id: id.into(),
            last_heartbeat,
            last_timestamp,
        }
    }
}

impl From<&MemberRecord> for GossipEntry {
    fn from(record: &MemberRecord) -> Self {
        Self {
            id: record.id.clone(),
            last_heartbeat: record.heartbeat,
            last_timestamp: record.last_updated_at,
        }
    }
}

impl From<&MemberRecord> for MemberView {
    fn from(record: &MemberRecord) -> Self {
        Self {
            id: record.id.clone(),
            last_heartbeat: record.heartbeat,
            last_timestamp: record.last_updated_at,
            status: record.status,
        }
    }
}
