#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use interactive_client::config;
use interactive_client::ConnectionOptions;
use interactive_core::encoding::Scheme;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
connection:
  address: "ws://127.0.0.1:3000/gameClient"
  compresion: gzip # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.connection.address, None);
    assert_eq!(cfg.connection.protocol_version, "2.0");
    assert_eq!(cfg.connection.compression, Scheme::Text);

    let options = ConnectionOptions::from(&cfg.connection);
    assert_eq!(options.call_timeout, Some(Duration::from_secs(10)));
    assert_eq!(options.handshake_timeout, Some(Duration::from_secs(10)));
    assert_eq!(options.gzip_level, 6);

    let headers = cfg.handshake_headers();
    assert_eq!(headers, vec![("X-Protocol-Version".to_string(), "2.0".to_string())]);
}

#[test]
fn full_config_builds_handshake_headers() {
    let ok = r#"
version: 1
connection:
  address: "wss://interactive.example/gameClient"
  call_timeout_ms: 2500
  compression: gzip
  gzip_level: 9
auth:
  authorization: "Bearer abc"
  project_version_id: 1234
  project_sharecode: "xyz"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.connection.compression, Scheme::Gzip);
    assert_eq!(cfg.connection.call_timeout(), Duration::from_millis(2500));

    let headers = cfg.handshake_headers();
    let get = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };
    assert_eq!(get("Authorization"), Some("Bearer abc"));
    assert_eq!(get("X-Interactive-Version"), Some("1234"));
    assert_eq!(get("X-Interactive-Sharecode"), Some("xyz"));
    assert_eq!(get("X-Protocol-Version"), Some("2.0"));
}

#[test]
fn rejects_out_of_range_values() {
    for bad in [
        "version: 2\n",
        "version: 1\nconnection:\n  call_timeout_ms: 5\n",
        "version: 1\nconnection:\n  handshake_timeout_ms: 700000\n",
        "version: 1\nconnection:\n  gzip_level: 10\n",
        "version: 1\nconnection:\n  protocol_version: \" \"\n",
        "version: 1\nconnection:\n  compression: brotli\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.code().as_str(), "CONFIG", "{bad}");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    let err = config::load_from_file("/nonexistent/interactive.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}
