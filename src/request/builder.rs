use std::future::IntoFuture;
use std::str::FromStr;

use futures::future::BoxFuture;
use http::header::HeaderName;
use http::uri::PathAndQuery;
use http::{HeaderMap, HeaderValue, Method, Uri, Version};
use serde::Serialize;
use serde_json::Value;

use crate::middleware::Next;
use crate::multipart::Form;
use crate::{Client, Error, InMemoryBody, InMemoryError, InMemoryRequest, InMemoryResponse, InMemoryResult, Response};

/// Builds a request against a client. Invalid URIs and headers don't panic; the first one
/// is kept and returned from `build`/`send`.
#[derive(Debug)]
pub struct RequestBuilder<'a, C = Client> {
    client: &'a C,

    pub version: Version,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Option<InMemoryBody>,
    error: Option<InMemoryError>,
}

impl<'a, C> RequestBuilder<'a, C> {
    pub fn new(client: &'a C, method: Method, uri: Uri) -> Self {
        RequestBuilder {
            client,
            version: Version::default(),
            method,
            uri,
            headers: HeaderMap::default(),
            body: None,
            error: None,
        }
    }

    pub(crate) fn with_error(mut self, error: InMemoryError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    fn capture<T, E: Into<http::Error>>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.error.get_or_insert(Error::Http(e.into()));
                None
            }
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn url(mut self, uri: &str) -> Self {
        if let Some(uri) = self.capture(Uri::from_str(uri)) {
            self.uri = uri;
        }
        self
    }

    pub fn headers<S: AsRef<str>, I: Iterator<Item = (S, S)>>(mut self, headers: I) -> Self {
        for (k, v) in headers {
            self = self.header(k.as_ref(), v.as_ref());
        }
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        let key = self.capture(HeaderName::from_str(key));
        let value = self.capture(HeaderValue::from_str(value));
        if let (Some(key), Some(value)) = (key, value) {
            self.headers.insert(key, value);
        }
        self
    }

    pub fn bearer_auth(mut self, token: &str) -> Self {
        if let Some(value) = self.capture(HeaderValue::from_str(&format!("Bearer {}", token))) {
            self.headers.insert(http::header::AUTHORIZATION, value);
        }
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        if let Some(value) = self.capture(HeaderValue::from_str(content_type)) {
            self.headers.insert(http::header::CONTENT_TYPE, value);
        }
        self
    }

    /// Add a url query parameter, but keep existing parameters.
    pub fn query(mut self, k: &str, v: &str) -> Self {
        let mut parts = std::mem::take(&mut self.uri).into_parts();
        let (path, query) = match parts.path_and_query.as_ref() {
            Some(pq) => (pq.path().to_string(), pq.query().map(str::to_string)),
            None => ("/".to_string(), None),
        };
        let pair = format!("{}={}", urlencoding::encode(k), urlencoding::encode(v));
        let pq = match query {
            Some(q) => format!("{path}?{q}&{pair}"),
            None => format!("{path}?{pair}"),
        };
        if let Some(pq) = self.capture(PathAndQuery::from_str(&pq)) {
            parts.path_and_query = Some(pq);
        }
        if let Some(uri) = self.capture(Uri::from_parts(parts)) {
            self.uri = uri;
        }
        self
    }

    /// Overwrite the current body with the provided JSON object.
    pub fn set_json<S: Serialize>(mut self, obj: S) -> Self {
        match InMemoryBody::new_json(obj) {
            Ok(body) => self.body = Some(body),
            Err(e) => return self.with_error(e.into()),
        }
        self.headers.entry(http::header::CONTENT_TYPE).or_insert(HeaderValue::from_static("application/json"));
        self.headers.entry(http::header::ACCEPT).or_insert(HeaderValue::from_static("application/json"));
        self
    }

    /// Add the fields of the provided JSON object to the current body.
    pub fn json<S: Serialize>(self, obj: S) -> Self {
        if self.body.is_none() {
            return self.set_json(obj);
        }
        let obj = match serde_json::to_value(obj) {
            Ok(Value::Object(obj)) => obj,
            Ok(_) => return self.with_error(Error::custom("Tried to push a non-object to a json body.")),
            Err(e) => return self.with_error(e.into()),
        };
        let mut this = self;
        match this.body {
            Some(InMemoryBody::Json(Value::Object(ref mut body))) => {
                body.extend(obj);
                this
            }
            _ => this.with_error(Error::custom("Tried to call .json() on a non-json body. Use .set_json to replace the body.")),
        }
    }

    /// Sets content-type to `application/x-www-form-urlencoded` and the body to the encoded fields.
    pub fn form<S: Serialize>(mut self, obj: S) -> Self {
        match serde_qs::to_string(&obj) {
            Ok(encoded) => self.body = Some(InMemoryBody::Text(encoded)),
            Err(e) => return self.with_error(e.into()),
        }
        self.headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        self
    }

    /// Sets a `multipart/*` body. Content-type carries the form's boundary.
    pub fn multipart(mut self, form: Form<InMemoryBody>) -> Self {
        if let Some(value) = self.capture(HeaderValue::from_str(&form.full_content_type())) {
            self.headers.insert(http::header::CONTENT_TYPE, value);
        }
        let bytes: Vec<u8> = form.into();
        self.body = Some(InMemoryBody::Bytes(bytes));
        self
    }

    /// Sets content-type to `text/plain` and the body to the supplied text.
    pub fn text(mut self, text: String) -> Self {
        self.body = Some(InMemoryBody::Text(text));
        self.headers.entry(http::header::CONTENT_TYPE).or_insert(HeaderValue::from_static("text/plain"));
        self
    }

    /// Sets content-type to `application/octet-stream` and the body to the supplied bytes.
    pub fn bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(InMemoryBody::Bytes(bytes));
        self.headers.entry(http::header::CONTENT_TYPE).or_insert(HeaderValue::from_static("application/octet-stream"));
        self
    }

    /// Warning: Does not set content-type!
    pub fn body(mut self, body: InMemoryBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn build(self) -> InMemoryResult<InMemoryRequest> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(InMemoryRequest {
            method: self.method,
            uri: self.uri,
            version: self.version,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
        })
    }
}

impl<'a> RequestBuilder<'a> {
    pub async fn send(self) -> crate::Result<Response> {
        let client = self.client;
        let request = self.build()?;
        let next = Next {
            client,
            middlewares: client.middlewares.as_slice(),
        };
        next.run(request).await
    }

    /// Normally, we have to `await` the body as well. This convenience method makes the body
    /// available immediately, and turns 4xx/5xx statuses into `Error::HttpError`.
    pub fn send_awaiting_body(self) -> BoxFuture<'a, InMemoryResult<InMemoryResponse>> {
        Box::pin(async move {
            let res = match self.send().await {
                Ok(res) => res,
                Err(e) => return Err(e.into_memory().await),
            };
            let (parts, body) = res.into_parts();
            let body = body.into_memory().await?;
            let res = InMemoryResponse::from_parts(parts, body);
            if res.status().is_client_error() || res.status().is_server_error() {
                Err(Error::HttpError(res))
            } else {
                Ok(res)
            }
        })
    }
}

impl<'a> IntoFuture for RequestBuilder<'a, Client> {
    type Output = crate::Result<Response>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.send())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn builder<'a>(client: &'a Client, uri: &str) -> RequestBuilder<'a> {
        RequestBuilder::new(client, Method::GET, uri.parse().unwrap())
    }

    #[test]
    fn test_query_keeps_existing() {
        let client = Client::new();
        let r = builder(&client, "http://example.com/foo?a=1").query("b", "2");
        assert_eq!(r.uri.to_string(), "http://example.com/foo?a=1&b=2");
    }

    #[test]
    fn test_query_is_encoded() {
        let client = Client::new();
        let r = builder(&client, "http://example.com/auth/refresh").query("refresh_token", "a b/c");
        assert_eq!(r.uri.to_string(), "http://example.com/auth/refresh?refresh_token=a%20b%2Fc");
    }

    #[test]
    fn test_json_merges_objects() {
        let client = Client::new();
        let request = builder(&client, "http://example.com/")
            .json(json!({"title": "milk"}))
            .json(json!({"status": "pending"}))
            .build()
            .unwrap();
        assert_eq!(request.body, InMemoryBody::Json(json!({"title": "milk", "status": "pending"})));
        assert_eq!(request.headers[http::header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_form_body() {
        let client = Client::new();
        #[derive(Serialize)]
        struct Login<'a> {
            username: &'a str,
            password: &'a str,
        }
        let request = builder(&client, "http://example.com/")
            .form(Login { username: "a@b.c", password: "pw" })
            .build()
            .unwrap();
        assert_eq!(request.body, InMemoryBody::Text("username=a%40b.c&password=pw".to_string()));
    }

    #[test]
    fn test_invalid_header_is_reported_by_build() {
        let client = Client::new();
        let err = builder(&client, "http://example.com/")
            .header("x-note", "line\nbreak")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
