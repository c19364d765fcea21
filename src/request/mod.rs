use std::str::FromStr;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Uri, Version};
use http::header::{HeaderName, AUTHORIZATION};
use http_body_util::Full;

pub use builder::RequestBuilder;

use crate::{InMemoryBody, InMemoryResult};

mod builder;

pub type InMemoryRequest = Request<InMemoryBody>;

/// An outgoing request. Middlewares receive it fully buffered so it can be cloned and re-sent.
#[derive(Debug)]
pub struct Request<B = InMemoryBody> {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: B,
}

impl<B> Request<B> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn url(&self) -> &Uri {
        &self.uri
    }

    pub fn host(&self) -> &str {
        self.uri.host().unwrap_or("")
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    /// The bearer token carried by this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }

    pub fn query_param(&self, key: &str) -> Option<String> {
        self.uri.query()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            if urlencoding::decode(k).ok()? == key {
                urlencoding::decode(v).ok().map(|v| v.into_owned())
            } else {
                None
            }
        })
    }
}

impl InMemoryRequest {
    pub fn test(method: &str, url: &str) -> Self {
        Self {
            method: Method::from_str(&method.to_uppercase()).unwrap_or_default(),
            uri: Uri::from_str(url).unwrap_or_default(),
            version: Version::default(),
            headers: HeaderMap::default(),
            body: InMemoryBody::Empty,
        }
    }

    pub fn set_body(mut self, body: InMemoryBody) -> Self {
        self.body = body;
        self
    }

    pub fn set_header(mut self, key: impl Into<HeaderName>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn set_url(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Convert into the type the transport sends.
    pub(crate) fn into_hyper(self) -> InMemoryResult<http::Request<Full<Bytes>>> {
        let body: Bytes = self.body.bytes()?;
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .version(self.version)
            .body(Full::new(body))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

impl Clone for InMemoryRequest {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            uri: self.uri.clone(),
            version: self.version,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        let request = InMemoryRequest::test("get", "http://localhost/todos/")
            .set_header(AUTHORIZATION, HeaderValue::from_static("Bearer A1"));
        assert_eq!(request.bearer_token(), Some("A1"));
        let request = InMemoryRequest::test("get", "http://localhost/todos/");
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn test_query_param() {
        let request = InMemoryRequest::test("post", "http://localhost/auth/refresh?refresh_token=a%2Fb&x=1");
        assert_eq!(request.query_param("refresh_token").as_deref(), Some("a/b"));
        assert_eq!(request.query_param("missing"), None);
    }
}
