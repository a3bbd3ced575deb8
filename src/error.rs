use crate::gossip::NodeId;
use failure::Fail;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum MembershipError {
    #[fail(display = "unknown node '{}'", _0)]
    UnknownNode(NodeId),
    #[fail(display = "malformed gossip payload: {}", _0)]
    MalformedPayload(String),
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),
}
