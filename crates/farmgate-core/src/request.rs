//! The decoded request handed to middleware and handlers.

use crate::method::HttpMethod;
use bytes::Bytes;
use http::HeaderMap;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A file received in a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field_name: String,
    /// Client-supplied file name.
    pub file_name: Option<String>,
    /// Declared content type of the part.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadedFile {
    /// Returns the file size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn describe(&self) -> Value {
        serde_json::json!({
            "file_name": self.file_name,
            "content_type": self.content_type,
            "size": self.size(),
        })
    }
}

/// A request body after content-type driven decoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body, or only whitespace.
    #[default]
    Empty,
    /// Parsed `application/json` body.
    Json(Value),
    /// Parsed `application/x-www-form-urlencoded` body, in wire order.
    Form(IndexMap<String, String>),
    /// Parsed `multipart/form-data` body.
    Multipart {
        /// Text fields in wire order.
        fields: IndexMap<String, String>,
        /// Uploaded files.
        files: Vec<UploadedFile>,
    },
    /// Any other content type, unmodified.
    Raw(Bytes),
}

impl RequestBody {
    /// Returns `true` for [`RequestBody::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the parsed JSON value, if this is a JSON body.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Renders the body as a JSON value.
    ///
    /// Raw bodies render as a (lossy) UTF-8 string.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Json(v) => v.clone(),
            Self::Form(map) => string_map(map),
            Self::Multipart { fields, files } => {
                let mut out = match string_map(fields) {
                    Value::Object(m) => m,
                    _ => Map::new(),
                };
                for file in files {
                    out.insert(file.field_name.clone(), file.describe());
                }
                Value::Object(out)
            }
            Self::Raw(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

fn string_map(map: &IndexMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// A routed request.
///
/// `path` is the raw request path (without the query string); `route_path`
/// is the same path with any API version prefix removed, which is what
/// route patterns match against.
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpMethod,
    path: String,
    route_path: String,
    query: IndexMap<String, String>,
    headers: HeaderMap,
    body: RequestBody,
    params: IndexMap<String, String>,
}

impl Request {
    /// Creates a request with an empty body and no parameters.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            route_path: path.clone(),
            path,
            query: IndexMap::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            params: IndexMap::new(),
        }
    }

    /// Sets the version-stripped path.
    #[must_use]
    pub fn with_route_path(mut self, route_path: impl Into<String>) -> Self {
        self.route_path = route_path.into();
        self
    }

    /// Sets the parsed query string.
    #[must_use]
    pub fn with_query(mut self, query: IndexMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the decoded body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Sets the path parameters, in template order.
    #[must_use]
    pub fn with_params(mut self, params: IndexMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the raw path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the version-stripped path.
    #[must_use]
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    /// Returns the parsed query string.
    #[must_use]
    pub fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the decoded body.
    #[must_use]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Returns the named path parameters.
    #[must_use]
    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    /// Returns a single path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Returns the path parameter values in template order.
    #[must_use]
    pub fn positional_params(&self) -> Vec<String> {
        self.params.values().cloned().collect()
    }

    /// Flattens the request into a single JSON object.
    ///
    /// Query parameters come first, then body fields (object bodies only),
    /// then path parameters; later sources overwrite earlier keys.
    #[must_use]
    pub fn to_legacy_map(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (k, v) in &self.query {
            out.insert(k.clone(), Value::String(v.clone()));
        }
        match self.body.to_json() {
            Value::Object(fields) => out.extend(fields),
            Value::Null => {}
            other => {
                out.insert("body".to_string(), other);
            }
        }
        for (k, v) in &self.params {
            out.insert(k.clone(), Value::String(v.clone()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_positional_params_follow_template_order() {
        let req = Request::new(HttpMethod::Get, "/users/7/posts/9")
            .with_params(params(&[("user", "7"), ("post", "9")]));
        assert_eq!(req.positional_params(), vec!["7", "9"]);
        assert_eq!(req.param("post"), Some("9"));
    }

    #[test]
    fn test_legacy_map_merges_sources() {
        let req = Request::new(HttpMethod::Put, "/users/7")
            .with_query(params(&[("expand", "roles"), ("id", "query")]))
            .with_body(RequestBody::Json(json!({"name": "Ada"})))
            .with_params(params(&[("id", "7")]));

        let map = req.to_legacy_map();
        assert_eq!(map["expand"], "roles");
        assert_eq!(map["name"], "Ada");
        assert_eq!(map["id"], "7");
    }

    #[test]
    fn test_legacy_map_keeps_non_object_body() {
        let req = Request::new(HttpMethod::Post, "/batch").with_body(RequestBody::Json(json!([1, 2])));
        assert_eq!(req.to_legacy_map()["body"], json!([1, 2]));
    }

    #[test]
    fn test_multipart_to_json() {
        let body = RequestBody::Multipart {
            fields: params(&[("title", "report")]),
            files: vec![UploadedFile {
                field_name: "upload".into(),
                file_name: Some("a.txt".into()),
                content_type: Some("text/plain".into()),
                data: Bytes::from_static(b"hello"),
            }],
        };
        let value = body.to_json();
        assert_eq!(value["title"], "report");
        assert_eq!(value["upload"]["size"], 5);
    }
}
