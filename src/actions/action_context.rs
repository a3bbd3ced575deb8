use crate::gossip::{GossipReceiver, MembershipTable};

#[derive(Clone)]
pub struct ActionContext {
    pub table: MembershipTable,
    pub receiver: GossipReceiver,
}

impl ActionContext {
    pub fn new(table: MembershipTable) -> Self {
        let receiver = GossipReceiver::new(table.clone());
        Self { table, receiver }
    }
}
