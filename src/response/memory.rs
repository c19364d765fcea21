use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::{Body, InMemoryBody, InMemoryResult, Response};

pub type InMemoryResponse = Response<InMemoryBody>;

/// Accessors for a response whose body has already been read.
pub trait InMemoryResponseExt {
    fn text(self) -> InMemoryResult<String>;
    fn json<U: DeserializeOwned>(self) -> InMemoryResult<U>;
    fn bytes(self) -> InMemoryResult<Bytes>;
}

impl InMemoryResponseExt for InMemoryResponse {
    fn text(self) -> InMemoryResult<String> {
        self.into_body().text()
    }

    fn json<U: DeserializeOwned>(self) -> InMemoryResult<U> {
        self.into_body().json().map_err(Into::into)
    }

    fn bytes(self) -> InMemoryResult<Bytes> {
        self.into_body().bytes()
    }
}

/// Build a buffered response. Mostly useful for middlewares that answer without the network.
pub fn in_memory_response(status: StatusCode, body: InMemoryBody) -> Response<Body> {
    let mut res = Response::new(Body::InMemory(body));
    *res.status_mut() = status;
    res
}
