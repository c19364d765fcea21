use http::header::CONTENT_DISPOSITION;
use http::{HeaderMap, HeaderValue};

use crate::InMemoryBody;

#[derive(Debug)]
pub struct Part<B> {
    pub headers: HeaderMap,
    pub body: B,
}

impl<B> Part<B> {
    pub fn new(headers: HeaderMap, body: B) -> Self {
        Part { headers, body }
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Quotes are the only character that can't appear inside a quoted field name.
fn disposition(name: &str) -> HeaderValue {
    let name = name.replace('"', "%22");
    HeaderValue::from_str(&format!("form-data; name=\"{name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("form-data"))
}

impl Part<InMemoryBody> {
    /// A `multipart/form-data` field without a content-type, as browsers send text inputs.
    pub fn field(name: &str, value: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_DISPOSITION, disposition(name));
        Part { headers, body: InMemoryBody::Text(value.to_string()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_disposition() {
        let part = Part::field("user\"name", "x");
        assert_eq!(part.header_str("content-disposition"), Some("form-data; name=\"user%22name\""));
    }
}
