//! Gzip encoding vector tests (streams produced by an independent zlib).

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use interactive_core::encoding::{Encoding, GzipEncoding};

mod vector_loader;
use vector_loader::load;

#[test]
fn gzip_vectors() {
    let files = [
        "gzip_square_reply.json",
        "gzip_stream.json",
        "gzip_empty_payload.json",
        "gzip_missing_prefix.json",
        "gzip_reversed.json",
        "gzip_short_stream.json",
    ];

    for f in files {
        let v = load(f);
        let mut codec = GzipEncoding::new();

        if let Some(err) = v.expect_error {
            let mut last = Ok(String::new());
            for frame in &v.frames {
                last = codec.decode(&frame.decode());
                if last.is_err() {
                    break;
                }
            }
            let e = last.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let expect = v.expect.expect("missing expect block");
        let expect = expect.as_array().expect("expect must be an array");
        assert_eq!(expect.len(), v.frames.len(), "vector={}", v.description);

        for (frame, want) in v.frames.iter().zip(expect) {
            let got = codec.decode(&frame.decode()).expect("decode");
            assert_eq!(got, want.as_str().unwrap(), "vector={}", v.description);
        }
    }
}
