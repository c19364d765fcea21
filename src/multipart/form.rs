use crate::multipart::part::Part;
use crate::multipart::{gen_boundary, write_boundary, write_headers, write_terminate, WriteBytes};
use crate::InMemoryBody;

/// A form has no headers of its own: the request it is sent with carries the content-type,
/// built with `full_content_type`.
#[derive(Debug)]
pub struct Form<B> {
    pub boundary: String,
    // doesn't include the boundary. use `full_content_type` to get the full content type.
    pub content_type: String,
    pub parts: Vec<Part<B>>,
}

impl<B> Form<B> {
    #[must_use]
    pub fn full_content_type(&self) -> String {
        format!("{}; boundary={}", self.content_type, &self.boundary)
    }

    #[must_use]
    pub fn boundary(mut self, boundary: String) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn form_data() -> Self {
        Form {
            content_type: "multipart/form-data".to_string(),
            boundary: gen_boundary(),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn part(mut self, part: Part<B>) -> Self {
        self.parts.push(part);
        self
    }
}

impl Form<InMemoryBody> {
    /// Add a plain `name=value` field.
    #[must_use]
    pub fn text(self, name: &str, value: &str) -> Self {
        self.part(Part::field(name, value))
    }
}

impl<T: WriteBytes> From<Form<T>> for Vec<u8> {
    fn from(value: Form<T>) -> Self {
        let boundary = value.boundary.as_bytes();
        let mut buf = Vec::new();
        for part in value.parts {
            write_boundary(&mut buf, boundary);
            write_headers(&mut buf, &part.headers);
            let n = buf.len();
            part.body.write(&mut buf);
            if buf.len() > n {
                buf.extend_from_slice(b"\r\n");
            }
        }
        write_terminate(&mut buf, boundary);
        buf
    }
}
