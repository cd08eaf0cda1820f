//! Envelope parsing vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use interactive_core::protocol::{decode_packets, Envelope, Method, Reply};

mod vector_loader;
use vector_loader::load_raw;

fn single(name: &str) -> Envelope {
    let mut packets = decode_packets(&load_raw(name)).unwrap();
    assert_eq!(packets.len(), 1, "vector={name}");
    packets.remove(0)
}

#[test]
fn parse_method() {
    let Envelope::Method(m) = single("method_square.json") else {
        panic!("expected method");
    };
    assert_eq!(m.method, "square");
    assert_eq!(m.params, json!(2));
    assert_eq!(m.id, 0);
    assert!(!m.discard);
    assert_eq!(m.seq, Some(0));
}

#[test]
fn hello_without_id_defaults() {
    let Envelope::Method(m) = single("hello_discard.json") else {
        panic!("expected method");
    };
    assert!(m.is_hello());
    assert!(m.discard);
    assert_eq!(m.id, 0);
    assert_eq!(m.seq, None);
}

#[test]
fn reply_result_and_seq() {
    let env = single("reply_ok.json");
    assert_eq!(env.seq(), Some(12));
    let Envelope::Reply(r) = env else {
        panic!("expected reply");
    };
    assert_eq!(r.into_outcome().unwrap(), json!(4));
}

#[test]
fn null_error_key_still_fails() {
    let Envelope::Reply(r) = single("reply_error_null.json") else {
        panic!("expected reply");
    };
    assert_eq!(r.error, Some(serde_json::Value::Null));
    let err = r.into_outcome().unwrap_err();
    assert_eq!(err.code().as_str(), "REMOTE");
}

#[test]
fn error_payload_is_kept() {
    let Envelope::Reply(r) = single("reply_error_payload.json") else {
        panic!("expected reply");
    };
    let err = r.into_outcome().unwrap_err();
    assert_eq!(err.remote_payload().unwrap()["code"], json!(4019));
}

#[test]
fn batch_keeps_order() {
    let packets = decode_packets(&load_raw("batch.json")).unwrap();
    assert_eq!(packets.len(), 2);
    assert!(matches!(&packets[0], Envelope::Method(m) if m.method == "onSceneUpdate"));
    assert!(matches!(&packets[1], Envelope::Reply(r) if r.id == 1));
    assert_eq!(packets[1].seq(), Some(9));
}

#[test]
fn unknown_type_is_protocol_error() {
    let err = decode_packets(&load_raw("unknown_type.json")).unwrap_err();
    assert_eq!(err.code().as_str(), "PROTOCOL");

    let err = decode_packets("{not json").unwrap_err();
    assert_eq!(err.code().as_str(), "PROTOCOL");
}

#[test]
fn outgoing_method_shape() {
    let env = Envelope::Method(Method {
        id: 0,
        method: "square".into(),
        params: json!(2),
        discard: false,
        seq: Some(0),
    });
    let v: serde_json::Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();
    assert_eq!(
        v,
        json!({"type": "method", "method": "square", "params": 2, "discard": false, "id": 0, "seq": 0})
    );
}

#[test]
fn outgoing_reply_omits_absent_side() {
    let ok = Envelope::Reply(Reply::ok(5, json!({"x": 1})));
    let v: serde_json::Value = serde_json::from_str(&ok.to_json().unwrap()).unwrap();
    assert_eq!(v, json!({"type": "reply", "id": 5, "result": {"x": 1}}));

    let err = Envelope::Reply(Reply::err(6, json!("nope")));
    let v: serde_json::Value = serde_json::from_str(&err.to_json().unwrap()).unwrap();
    assert_eq!(v, json!({"type": "reply", "id": 6, "error": "nope"}));
}
