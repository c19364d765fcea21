//! `multipart/*` request bodies. The backend's login endpoint takes its credentials as
//! `multipart/form-data`.
use http::HeaderMap;
use rand::Rng;

pub use form::Form;
pub use part::Part;

use crate::InMemoryBody;

mod form;
mod part;

fn gen_boundary() -> String {
    let mut rng = rand::rng();

    let a = rng.random::<u64>();
    let b = rng.random::<u64>();
    let c = rng.random::<u64>();
    let d = rng.random::<u64>();

    format!("{a:016x}-{b:016x}-{c:016x}-{d:016x}")
}

fn write_terminate(buf: &mut Vec<u8>, boundary: &[u8]) {
    buf.extend_from_slice(b"--");
    buf.extend_from_slice(boundary);
    buf.extend_from_slice(b"--\r\n");
}

fn write_boundary(buf: &mut Vec<u8>, boundary: &[u8]) {
    buf.extend_from_slice(b"--");
    buf.extend_from_slice(boundary);
    buf.extend_from_slice(b"\r\n");
}

fn write_headers(buf: &mut Vec<u8>, headers: &HeaderMap) {
    for (key, value) in headers {
        buf.extend_from_slice(key.as_str().as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(b"\r\n");
}

/// How a part's body is written into the request buffer.
pub trait WriteBytes {
    fn write(self, buf: &mut Vec<u8>);
}

impl WriteBytes for InMemoryBody {
    fn write(self, buf: &mut Vec<u8>) {
        match self {
            InMemoryBody::Empty => {}
            InMemoryBody::Bytes(b) => buf.extend_from_slice(&b),
            InMemoryBody::Text(s) => buf.extend_from_slice(s.as_bytes()),
            InMemoryBody::Json(val) => buf.extend_from_slice(val.to_string().as_bytes()),
        }
    }
}
