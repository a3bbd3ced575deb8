use actix_web::http::StatusCode;
use actix_web::{test, App};
use murmur::gossip::{MemberStatus, MembershipTable, NodeId};
use murmur::proto::{GossipEntry, MemberView, PingResponse};
use murmur::rpc_client::RpcClient;
use murmur::{node, web, ActionExecutor, Clock, Config};
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};

const LOCAL: &str = "127.0.0.1:7000";
const NOW: u64 = 1_600_000_000;

fn table() -> (Clock, MembershipTable) {
    let clock = Clock::manual(Duration::from_secs(NOW));
    let table = MembershipTable::new(LOCAL.into(), clock.clone());
    table.seed(LOCAL.into(), 4, NOW);
    table.seed("127.0.0.1:7001".into(), 2, NOW - 3);
    (clock, table)
}

macro_rules! init_app {
    ($table:expr) => {
        test::init_service(App::new().configure(web::configure(ActionExecutor::new($table.clone()))))
            .await
    };
}

#[actix_web::test]
async fn test_ping() {
    let (_, table) = table();
    let app = init_app!(table);
    let request = test::TestRequest::get().uri("/ping").to_request();
    let response: PingResponse = test::call_and_read_body_json(&app, request).await;
    assert_eq!(response, PingResponse::pong(LOCAL.into()));
}

#[actix_web::test]
async fn test_list_members_reports_status() {
    let (clock, table) = table();
    clock.advance(Duration::from_secs(5));
    table.suspect_where(|record| record.id.as_str() != LOCAL);

    let app = init_app!(table);
    let request = test::TestRequest::get().uri("/members").to_request();
    let members: Vec<MemberView> = test::call_and_read_body_json(&app, request).await;
    assert_eq!(
        members,
        vec![
            MemberView {
                id: LOCAL.into(),
                last_heartbeat: 4,
                last_timestamp: NOW,
                status: MemberStatus::Alive,
            },
            MemberView {
                id: "127.0.0.1:7001".into(),
                last_heartbeat: 2,
                last_timestamp: NOW - 3,
                status: MemberStatus::Suspected,
            },
        ]
    );
}

#[actix_web::test]
async fn test_push_gossip_merges_and_acks() {
    let (_, table) = table();
    let app = init_app!(table);
    let entries = vec![
        GossipEntry::new("127.0.0.1:7001", 3, NOW),
        GossipEntry::new("127.0.0.1:7002", 1, NOW - 1),
    ];
    let request = test::TestRequest::post()
        .uri("/gossip")
        .set_json(&entries)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body, json!({}));

    let peer = table.get("127.0.0.1:7001").unwrap();
    assert_eq!(peer.heartbeat, 3);
    assert_eq!(peer.last_updated_at, NOW);
    assert!(table.contains("127.0.0.1:7002"));
}

#[actix_web::test]
async fn test_push_gossip_rejects_non_list() {
    let (_, table) = table();
    let app = init_app!(table);
    for body in &["not json", r#"{"id": "127.0.0.1:7003"}"#, "42"] {
        let request = test::TestRequest::post()
            .uri("/gossip")
            .insert_header(("content-type", "application/json"))
            .set_payload(*body)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let error: serde_json::Value = test::read_body_json(response).await;
        assert!(error["error"].is_string());
    }
    assert_eq!(table.len(), 2);
}

#[actix_web::test]
async fn test_push_gossip_skips_malformed_entries() {
    let (_, table) = table();
    let app = init_app!(table);
    let body = json!([
        {"id": "", "last_heartbeat": 1, "last_timestamp": NOW},
        {"id": "127.0.0.1:7003", "last_heartbeat": "one", "last_timestamp": NOW},
        "127.0.0.1:7004",
        {"id": "127.0.0.1:7005", "last_heartbeat": 1, "last_timestamp": NOW},
    ]);
    let request = test::TestRequest::post()
        .uri("/gossip")
        .set_json(&body)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        table.member_ids(),
        vec![
            NodeId::from(LOCAL),
            NodeId::from("127.0.0.1:7001"),
            NodeId::from("127.0.0.1:7005"),
        ]
    );
}

#[actix_web::test]
async fn test_metrics_exposes_merge_counter() {
    let (_, table) = table();
    let app = init_app!(table);
    let request = test::TestRequest::post()
        .uri("/gossip")
        .set_json(&vec![GossipEntry::new("127.0.0.1:7009", 1, NOW)])
        .to_request();
    test::call_service(&app, request).await;

    let request = test::TestRequest::get().uri("/metrics").to_request();
    let body = test::call_and_read_body(&app, request).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("murmur_merge_total"), "{}", text);
}

#[actix_web::test]
async fn test_unknown_route_is_not_found() {
    let (_, table) = table();
    let app = init_app!(table);
    let request = test::TestRequest::get().uri("/gossip").to_request();
    let response = test::call_service(&app, request).await;
    assert!(response.status().is_client_error());
}

fn free_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

fn node_config(bind: &str, peer: &str) -> Config {
    let builder = Config::default_builder()
        .unwrap()
        .set_override("bind", bind)
        .unwrap()
        .set_override("peers", vec![peer])
        .unwrap();
    Config::from_builder(builder).unwrap()
}

fn sees_alive(members: &[MemberView], id: &NodeId) -> bool {
    members
        .iter()
        .any(|member| member.id == *id && member.status == MemberStatus::Alive && member.last_heartbeat > 0)
}

#[actix_web::test]
async fn test_two_nodes_gossip_over_http() {
    let _ = env_logger::builder().is_test(true).try_init();
    let address_a = free_address();
    let address_b = free_address();
    let configs = vec![node_config(&address_a, &address_b), node_config(&address_b, &address_a)];

    let client = RpcClient::new(Duration::from_millis(500)).unwrap();
    let mut schedulers = Vec::new();
    let mut servers = Vec::new();
    for config in &configs {
        let table = node::bootstrap_table(config, Clock::new());
        let transport = Arc::new(client.clone());
        schedulers.push(node::build_scheduler(config, table.clone(), transport).start());
        let server = web::start_web(config, ActionExecutor::new(table)).unwrap();
        servers.push(server.handle());
        actix_web::rt::spawn(server);
    }

    let id_a = configs[0].node_id();
    let id_b = configs[1].node_id();
    let pong = client.ping(&id_a).await.unwrap();
    assert_eq!(pong, PingResponse::pong(id_a.clone()));

    let deadline = Instant::now() + Duration::from_secs(15);
    loop {
        let view_a = client.list_members(&id_a).await.unwrap_or_default();
        let view_b = client.list_members(&id_b).await.unwrap_or_default();
        if sees_alive(&view_a, &id_b) && sees_alive(&view_b, &id_a) {
            break;
        }
        assert!(Instant::now() < deadline, "nodes never converged: {:?} {:?}", view_a, view_b);
        actix_web::rt::time::sleep(Duration::from_millis(200)).await;
    }

    for server in servers {
        server.stop(true).await;
    }
    for scheduler in schedulers {
        scheduler.stop().await;
    }
}
