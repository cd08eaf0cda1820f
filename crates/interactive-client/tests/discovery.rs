#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use interactive_client::discovery::{select_address, Discovery, StaticDiscovery};

#[test]
fn first_listed_server_wins() {
    let body = r#"[{"address":"wss://one.example/gameClient"},{"address":"wss://two.example/gameClient"}]"#;
    assert_eq!(select_address(body).unwrap(), "wss://one.example/gameClient");
}

#[test]
fn empty_listing_means_no_servers() {
    let err = select_address("[]").unwrap_err();
    assert_eq!(err.code().as_str(), "NO_SERVERS_AVAILABLE");
}

#[test]
fn malformed_listing_is_a_discovery_error() {
    for body in ["{}", "not json", r#"[{"host":"x"}]"#] {
        let err = select_address(body).unwrap_err();
        assert_eq!(err.code().as_str(), "DISCOVERY", "body: {body}");
    }
}

#[tokio::test]
async fn static_discovery_returns_its_address() {
    let discovery = StaticDiscovery::new("ws://127.0.0.1:3000/gameClient");
    assert_eq!(discovery.find().await.unwrap(), "ws://127.0.0.1:3000/gameClient");
}
