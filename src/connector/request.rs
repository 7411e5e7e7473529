//! Outgoing request description.
//!
//! # Responsibilities
//! - Describe a call independently of the HTTP client
//! - Build the header set (authorization, content type)
//! - Flatten object payloads into query / form pairs
//!
//! # Design Decisions
//! - Flat params go into the query string for GET and DELETE, into a JSON
//!   body otherwise
//! - The token is sent verbatim in `authorization`; empty tokens are dropped

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::connector::error::{ConnectorError, ConnectorResult};

/// Flat key/value parameters or a single JSON object body.
pub type Params = Map<String, Value>;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// What travels with the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    /// Flat parameters; placement depends on the method.
    Params(Params),
    /// Structured object body.
    Object(Params),
    /// Array of objects as the body.
    Array(Vec<Params>),
}

/// How a structured body is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    #[default]
    Json,
    FormUrlEncoded,
}

/// Where the payload ends up once encoding rules are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Empty,
    Query(Vec<(String, String)>),
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A single call as issued by the facade.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: String,
    pub method: Method,
    pub payload: Payload,
    pub encoding: BodyEncoding,
    pub token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            payload: Payload::None,
            encoding: BodyEncoding::Json,
            token: None,
        }
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Attach a token. Empty tokens are ignored.
    pub fn token(mut self, token: Option<&str>) -> Self {
        self.token = token.filter(|t| !t.is_empty()).map(str::to_owned);
        self
    }

    /// Header set for this call.
    pub fn headers(&self) -> ConnectorResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| ConnectorError::InvalidHeader("authorization"))?;
            headers.insert(AUTHORIZATION, value);
        }
        if self.encoding == BodyEncoding::FormUrlEncoded {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
        }
        Ok(headers)
    }

    /// Resolve where the payload goes for this method and encoding.
    pub fn placement(&self) -> ConnectorResult<Placement> {
        let in_query = self.method == Method::GET
            || self.method == Method::DELETE
            || self.method == Method::HEAD;

        let placement = match (&self.payload, self.encoding) {
            (Payload::None, _) => Placement::Empty,
            (Payload::Params(p) | Payload::Object(p), _) if in_query => {
                Placement::Query(flatten(p))
            }
            (Payload::Params(p) | Payload::Object(p), BodyEncoding::FormUrlEncoded) => {
                Placement::Form(flatten(p))
            }
            (Payload::Params(p) | Payload::Object(p), BodyEncoding::Json) => {
                Placement::Json(Value::Object(p.clone()))
            }
            (Payload::Array(_), BodyEncoding::FormUrlEncoded) => {
                return Err(ConnectorError::Encode(
                    "array bodies cannot be form-urlencoded".into(),
                ))
            }
            (Payload::Array(items), BodyEncoding::Json) => Placement::Json(Value::Array(
                items.iter().cloned().map(Value::Object).collect(),
            )),
        };
        Ok(placement)
    }
}

/// Flatten an object into string pairs. Strings are written unquoted,
/// nested values as compact JSON, nulls as empty strings.
pub fn flatten(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn token_sets_authorization_verbatim() {
        let req = ApiRequest::new(Method::GET, "/users").token(Some("abc123"));
        let headers = req.headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "abc123");
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn empty_token_is_dropped() {
        let req = ApiRequest::new(Method::GET, "/users").token(Some(""));
        assert!(req.token.is_none());
        assert!(req.headers().unwrap().is_empty());
    }

    #[test]
    fn form_encoding_sets_content_type() {
        let req = ApiRequest::new(Method::POST, "/login").encoding(BodyEncoding::FormUrlEncoded);
        let headers = req.headers().unwrap();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), FORM_URLENCODED);
    }

    #[test]
    fn invalid_token_is_rejected() {
        let req = ApiRequest::new(Method::GET, "/users").token(Some("bad\ntoken"));
        assert!(matches!(
            req.headers(),
            Err(ConnectorError::InvalidHeader("authorization"))
        ));
    }

    #[test]
    fn get_params_go_to_query() {
        let req = ApiRequest::new(Method::GET, "/users")
            .payload(Payload::Params(params(json!({"page": 2, "q": "bob"}))));
        let Placement::Query(mut pairs) = req.placement().unwrap() else {
            panic!("expected query placement");
        };
        pairs.sort();
        assert_eq!(
            pairs,
            vec![("page".into(), "2".into()), ("q".into(), "bob".into())]
        );
    }

    #[test]
    fn post_params_go_to_json_body() {
        let req = ApiRequest::new(Method::POST, "/users")
            .payload(Payload::Params(params(json!({"name": "bob"}))));
        assert_eq!(
            req.placement().unwrap(),
            Placement::Json(json!({"name": "bob"}))
        );
    }

    #[test]
    fn array_body_is_json_array() {
        let req = ApiRequest::new(Method::PUT, "/items").payload(Payload::Array(vec![
            params(json!({"id": 1})),
            params(json!({"id": 2})),
        ]));
        assert_eq!(
            req.placement().unwrap(),
            Placement::Json(json!([{"id": 1}, {"id": 2}]))
        );
    }

    #[test]
    fn array_body_cannot_be_form_encoded() {
        let req = ApiRequest::new(Method::PUT, "/items")
            .payload(Payload::Array(vec![]))
            .encoding(BodyEncoding::FormUrlEncoded);
        assert!(matches!(req.placement(), Err(ConnectorError::Encode(_))));
    }

    #[test]
    fn flatten_writes_scalars_plainly() {
        let pairs = flatten(&params(json!({"s": "x", "n": null, "b": true})));
        assert!(pairs.contains(&("s".into(), "x".into())));
        assert!(pairs.contains(&("n".into(), String::new())));
        assert!(pairs.contains(&("b".into(), "true".into())));
    }
}
