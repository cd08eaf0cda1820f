//! Encoding behaviour: streaming round-trips, registry, text floor.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use interactive_core::encoding::{from_name, Encoding, Frame, GzipEncoding, Scheme, TextEncoding};
use interactive_core::protocol::varint::{get_varint, put_varint};

fn binary(frame: Frame) -> Vec<u8> {
    match frame {
        Frame::Binary(b) => b.to_vec(),
        Frame::Text(_) => panic!("gzip must produce binary frames"),
    }
}

/// Split `s` into pieces at char boundaries, piece sizes cycling through `sizes`.
fn split_chars<'a>(s: &'a str, sizes: &[usize]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut rest = s;
    let mut i = 0;
    while !rest.is_empty() {
        let want = sizes[i % sizes.len()];
        let cut = rest
            .char_indices()
            .nth(want)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        out.push(&rest[..cut]);
        rest = &rest[cut..];
        i += 1;
    }
    out
}

#[test]
fn gzip_round_trip_samples() {
    let samples = [
        String::new(),
        "{\"id\":0,\"type\":\"reply\",\"result\":4}".to_string(),
        "naïve café — 日本語テキスト — 🎮🕹️".to_string(),
        "{\"scenes\":[".to_string() + &"{\"sceneID\":\"default\",\"controls\":[]},".repeat(400) + "{}]}",
    ];

    let mut tx = GzipEncoding::new();
    let mut rx = GzipEncoding::new();
    for sample in &samples {
        let wire = binary(tx.encode(sample).unwrap());
        assert_eq!(&rx.decode(&wire).unwrap(), sample);
    }
}

#[test]
fn gzip_stream_survives_arbitrary_message_boundaries() {
    let doc = "Pïxel ✓ ".repeat(300) + &"{\"participants\":[{\"sessionID\":\"x\"}]}".repeat(50);

    let plans: [&[usize]; 4] = [&[1], &[3, 17, 64], &[1000, 1], &[4096]];
    for sizes in plans {
        let mut tx = GzipEncoding::with_level(9);
        let mut rx = GzipEncoding::new();
        let pieces = split_chars(&doc, sizes);

        // Encoder runs ahead of the decoder, as with a burst of socket writes.
        let frames: Vec<Vec<u8>> = pieces.iter().map(|p| binary(tx.encode(p).unwrap())).collect();
        let rebuilt: String = frames.iter().map(|f| rx.decode(f).unwrap()).collect();
        assert_eq!(rebuilt, doc, "sizes={sizes:?}");
    }
}

#[test]
fn gzip_payload_larger_than_inflate_buffer() {
    let big: String = (0..200_000u32).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let mut tx = GzipEncoding::new();
    let mut rx = GzipEncoding::new();
    let wire = binary(tx.encode(&big).unwrap());
    assert_eq!(rx.decode(&wire).unwrap(), big);
    let wire = binary(tx.encode("tail").unwrap());
    assert_eq!(rx.decode(&wire).unwrap(), "tail");
}

#[test]
fn gzip_header_follows_first_length_prefix() {
    let mut tx = GzipEncoding::new();
    let wire = binary(tx.encode("hi").unwrap());
    let mut rest = &wire[..];
    assert_eq!(get_varint(&mut rest).unwrap(), 2);
    assert_eq!(&rest[..2], &[0x1f, 0x8b]);

    // Later frames continue the same stream: no second header.
    let wire = binary(tx.encode("hi").unwrap());
    let mut rest = &wire[..];
    assert_eq!(get_varint(&mut rest).unwrap(), 2);
    assert_ne!(&rest[..2], &[0x1f, 0x8b]);
}

#[test]
fn gzip_rejects_garbage() {
    let mut tx = GzipEncoding::new();
    let mut wire = binary(tx.encode("{\"id\":0}").unwrap());
    wire.reverse();
    let err = GzipEncoding::new().decode(&wire).unwrap_err();
    assert_eq!(err.code().as_str(), "CODEC");
}

#[test]
fn text_is_pass_through() {
    let mut text = TextEncoding;
    assert_eq!(text.encode("{}").unwrap(), Frame::Text("{}".into()));
    assert_eq!(text.decode("é".as_bytes()).unwrap(), "é");
    assert_eq!(text.decode(&[0xff, 0xfe]).unwrap_err().code().as_str(), "CODEC");
    assert!(text.is_text());
}

#[test]
fn registry_knows_text_and_gzip_only() {
    assert_eq!(from_name("text", 6).unwrap().name(), "text");
    assert_eq!(from_name("gzip", 6).unwrap().name(), "gzip");
    assert!(!from_name("gzip", 6).unwrap().is_text());
    let err = from_name("brotli", 6).unwrap_err();
    assert_eq!(err.code().as_str(), "UNKNOWN_SCHEME");
    assert_eq!("gzip".parse::<Scheme>().unwrap(), Scheme::Gzip);
}

#[test]
fn varint_round_trip_edges() {
    for n in [0u64, 1, 127, 128, 300, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
        let mut buf = Vec::new();
        put_varint(&mut buf, n);
        let mut rest = &buf[..];
        assert_eq!(get_varint(&mut rest).unwrap(), n);
        assert!(rest.is_empty());
    }

    let mut truncated: &[u8] = &[0x80, 0x80];
    assert_eq!(get_varint(&mut truncated).unwrap_err().code().as_str(), "CODEC");

    let mut overlong: &[u8] = &[0xff; 11];
    assert!(get_varint(&mut overlong).is_err());
}
