//! Request options accepted by the gateway

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::Method;

/// Body of a gateway request
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON with `Content-Type: application/json`
    Json(serde_json::Value),
    /// Multipart upload; the client sets the content type with its boundary
    Multipart(Form),
    /// Raw bytes; no content type is set unless the caller provides one
    Binary(Bytes),
}

impl RequestBody {
    /// Whether the gateway should set the JSON content type
    pub fn is_json(&self) -> bool {
        matches!(self, RequestBody::Empty | RequestBody::Json(_))
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "Empty"),
            RequestBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            RequestBody::Multipart(_) => write!(f, "Multipart(..)"),
            RequestBody::Binary(b) => write!(f, "Binary({} bytes)", b.len()),
        }
    }
}

/// Method, body and extra headers for one call
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    /// Merged last; these win over the gateway's own headers
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Default::default() }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn binary(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Binary(bytes.into());
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}
