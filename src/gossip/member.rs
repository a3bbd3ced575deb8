use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Logical clock owned by a single node.
pub type Heartbeat = u64;

/// Opaque node identity, conventionally `<host>:<port>`.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Alive,
    Suspected,
}

/// One peer as observed by the local node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberRecord {
    pub id: NodeId,
    pub heartbeat: Heartbeat,
    /// Local time at which this record was last accepted as fresher.
    pub last_updated_at: Timestamp,
    pub status: MemberStatus,
}

impl MemberRecord {
    pub fn new(id: NodeId, heartbeat: Heartbeat, last_updated_at: Timestamp) -> Self {
        Self {
            id,
            heartbeat,
            last_updated_at,
            status: MemberStatus::Alive,
        }
    }

    pub fn is_suspected(&self) -> bool {
        self.status == MemberStatus::Suspected
    }
}

/// Membership changes observed by the local table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MembershipEvent {
    Joined(NodeId),
    Suspected(NodeId),
    Recovered(NodeId),
    Evicted(NodeId),
}
