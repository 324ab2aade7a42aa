//! Per-call request options

use super::{ClientError, MultipartBody};
use reqwest::Method;
use serde::Serialize;
use std::fmt::Display;

/// Whether the stored session token may be attached to a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Never send the session token
    Omit,
    /// Send the session token when one is stored
    #[default]
    Include,
}

/// Request body
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

/// Method, headers, query, body and credentials mode for one call
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Body,
    pub credentials: Credentials,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            query: Vec::new(),
            body: Body::Empty,
            credentials: Credentials::default(),
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
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

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Add a header; later values for the same name replace earlier ones
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append a query pair. Repeating a key sends it several times.
    pub fn query(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query pair only when `value` is present
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Append one pair per item, all under `key`
    pub fn query_all<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        for value in values {
            self = self.query(key, value);
        }
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Body::Json(serde_json::to_value(body).map_err(ClientError::Encode)?);
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = Body::Multipart(body);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert_eq!(options.credentials, Credentials::Include);
        assert!(matches!(options.body, Body::Empty));
    }

    #[test]
    fn test_query_builders() {
        let options = RequestOptions::get()
            .query("page", 2)
            .query_opt("keyword", None::<&str>)
            .query_opt("status", Some("published"))
            .query_all("tags", ["faq", "billing"]);

        assert_eq!(
            options.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "published".to_string()),
                ("tags".to_string(), "faq".to_string()),
                ("tags".to_string(), "billing".to_string()),
            ]
        );
    }

    #[test]
    fn test_json_body() {
        let options = RequestOptions::post()
            .json(&serde_json::json!({"username": "admin"}))
            .unwrap();

        match options.body {
            Body::Json(value) => assert_eq!(value["username"], "admin"),
            other => panic!("expected JSON body, got {other:?}"),
        }
    }
}
