use bytes::Bytes;
use serde::de::{DeserializeOwned, Error};
use serde::Serialize;
use serde_json::Value;

use crate::sanitize::sanitize_value;
use crate::InMemoryResult;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum InMemoryBody {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    Json(Value),
}

impl TryInto<String> for InMemoryBody {
    type Error = crate::InMemoryError;

    fn try_into(self) -> InMemoryResult<String> {
        match self {
            InMemoryBody::Empty => Ok(String::new()),
            InMemoryBody::Bytes(b) => String::from_utf8(b).map_err(std::convert::Into::into),
            InMemoryBody::Text(s) => Ok(s),
            InMemoryBody::Json(val) => serde_json::to_string(&val).map_err(std::convert::Into::into),
        }
    }
}

impl TryInto<Bytes> for InMemoryBody {
    type Error = crate::InMemoryError;

    fn try_into(self) -> InMemoryResult<Bytes> {
        match self {
            InMemoryBody::Empty => Ok(Bytes::new()),
            InMemoryBody::Bytes(b) => Ok(Bytes::from(b)),
            InMemoryBody::Text(s) => Ok(Bytes::from(s)),
            InMemoryBody::Json(val) => Ok(Bytes::from(serde_json::to_vec(&val)?)),
        }
    }
}

impl InMemoryBody {
    pub fn new_text(text: impl Into<String>) -> Self {
        InMemoryBody::Text(text.into())
    }

    pub fn new_json(value: impl Serialize) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(InMemoryBody::Json)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        use InMemoryBody::{Bytes, Empty, Json, Text};
        match self {
            Empty => true,
            Bytes(b) => b.is_empty(),
            Text(s) => s.is_empty(),
            Json(_) => false,
        }
    }

    pub fn text(self) -> InMemoryResult<String> {
        self.try_into()
    }

    pub fn json<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        match self {
            InMemoryBody::Empty => Err(serde_json::Error::custom("Empty body")),
            InMemoryBody::Bytes(b) => serde_json::from_slice(&b),
            InMemoryBody::Text(t) => serde_json::from_str(&t),
            InMemoryBody::Json(v) => serde_json::from_value(v),
        }
    }

    pub fn bytes(self) -> InMemoryResult<Bytes> {
        self.try_into()
    }

    /// Mask credential-looking fields. Text bodies that parse as JSON are masked too.
    pub fn sanitize(&mut self) {
        match self {
            InMemoryBody::Json(value) => sanitize_value(value),
            InMemoryBody::Text(text) => {
                if let Ok(mut value) = serde_json::from_str::<Value>(text) {
                    sanitize_value(&mut value);
                    *self = InMemoryBody::Json(value);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_from_text() {
        let body = InMemoryBody::new_text(r#"{"access_token":"A1"}"#);
        let value: Value = body.json().unwrap();
        assert_eq!(value, json!({"access_token": "A1"}));
    }

    #[test]
    fn test_empty_body_is_not_json() {
        assert!(InMemoryBody::Empty.json::<Value>().is_err());
    }

    #[test]
    fn test_sanitize_text_body() {
        let mut body = InMemoryBody::new_text(r#"{"access_token":"A1","token_type":"bearer","id":3}"#);
        body.sanitize();
        assert_eq!(body, InMemoryBody::Json(json!({
            "access_token": "**********",
            "token_type": "**********",
            "id": 3,
        })));
    }
}
