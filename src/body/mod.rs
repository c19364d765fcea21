use http_body_util::BodyExt;
use hyper::body::Incoming;

pub use memory::*;

use crate::InMemoryResult;

mod memory;

/// A response body: either already buffered, or still streaming from the connection.
#[derive(Debug)]
pub enum Body {
    InMemory(InMemoryBody),
    Hyper(Incoming),
}

impl Body {
    pub fn empty() -> Self {
        Body::InMemory(InMemoryBody::Empty)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::InMemory(m) => m.is_empty(),
            Body::Hyper(b) => http_body::Body::is_end_stream(b),
        }
    }

    /// Read the rest of the body. Valid utf-8 becomes `Text`, anything else `Bytes`.
    pub async fn into_memory(self) -> InMemoryResult<InMemoryBody> {
        match self {
            Body::InMemory(m) => Ok(m),
            Body::Hyper(incoming) => {
                let bytes = incoming.collect().await?.to_bytes();
                if bytes.is_empty() {
                    return Ok(InMemoryBody::Empty);
                }
                match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => Ok(InMemoryBody::Text(text)),
                    Err(e) => Ok(InMemoryBody::Bytes(e.into_bytes())),
                }
            }
        }
    }
}

impl From<InMemoryBody> for Body {
    fn from(value: InMemoryBody) -> Self {
        Body::InMemory(value)
    }
}

impl From<Incoming> for Body {
    fn from(value: Incoming) -> Self {
        Body::Hyper(value)
    }
}
