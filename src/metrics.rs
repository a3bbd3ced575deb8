use crate::gossip::{MemberRecord, MemberStatus};
use lazy_static::*;
use log::*;
use prometheus::*;

pub fn dump() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_familys = gather();
    for mf in metric_familys {
        if let Err(e) = encoder.encode(&[mf], &mut buffer) {
            warn!("prometheus encoding error: {:?}", e);
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn observe_members(members: &[MemberRecord]) {
    let suspected = members
        .iter()
        .filter(|member| member.status == MemberStatus::Suspected)
        .count();
    MEMBERS_GAUGE
        .with_label_values(&["alive"])
        .set((members.len() - suspected) as i64);
    MEMBERS_GAUGE
        .with_label_values(&["suspected"])
        .set(suspected as i64);
}

lazy_static! {
    pub static ref MERGE_COUNTER: IntCounterVec = register_int_counter_vec!(
        "murmur_merge_total",
        "Gossip entries merged into the membership table, by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref MALFORMED_ENTRY_COUNTER: IntCounter = register_int_counter!(
        "murmur_malformed_entries_total",
        "Inbound gossip entries skipped because they could not be decoded"
    ).unwrap();

    pub static ref DETECTOR_COUNTER: IntCounterVec = register_int_counter_vec!(
        "murmur_detector_transitions_total",
        "Membership state transitions, by kind",
        &["transition"]
    ).unwrap();

    pub static ref GOSSIP_PUSH_COUNTER: IntCounterVec = register_int_counter_vec!(
        "murmur_gossip_push_total",
        "Outbound gossip pushes, by result",
        &["result"]
    ).unwrap();

    pub static ref MEMBERS_GAUGE: IntGaugeVec = register_int_gauge_vec!(
        "murmur_members",
        "Members in the local table, by status",
        &["status"]
    ).unwrap();

    pub static ref TICK_HISTOGRAM: Histogram = register_histogram!(
        "murmur_tick_duration_seconds",
        "Bucketed histogram of protocol tick durations"
    ).unwrap();

    pub static ref WEB_REQUEST_HISTOGRAM: HistogramVec = register_histogram_vec!(
        "murmur_web_request_duration_seconds",
        "Bucketed histogram of http requests",
        &["type"]
    ).unwrap();
}
