//! The membership protocol: table, failure detection and dissemination.

mod disseminator;
mod failure_detector;
mod member;
mod receiver;
mod scheduler;
mod table;

pub use self::disseminator::{DisseminationReport, GossipDisseminator, GossipTransport};
pub use self::failure_detector::{detect_suspects, evict_dead, FailureDetector};
pub use self::member::{Heartbeat, MemberRecord, MemberStatus, MembershipEvent, NodeId};
pub use self::receiver::{GossipReceiver, ReceiveReport};
pub use self::scheduler::{ProtocolScheduler, SchedulerHandle, TickReport};
pub use self::table::{MembershipTable, MergeOutcome, MergeSummary};
