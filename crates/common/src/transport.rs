//! Transport collaborator for the remote API
//!
//! The record layer never talks HTTP directly; it hands a [`Request`] to a
//! [`Transport`] and interprets the [`Response`]. [`HttpTransport`] talks to a
//! live server, `MemoryServer` sessions answer from an in-process model.

use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single API call
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and decoded body of an API call
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort human readable error text from the body
    pub fn error_message(&self) -> String {
        let error = self.body.get("error").unwrap_or(&self.body);
        if let Some(messages) = error.get("full_messages").and_then(Value::as_array) {
            let joined: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
            if !joined.is_empty() {
                return joined.join("; ");
            }
        }
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        match &self.body {
            Value::String(text) if !text.is_empty() => text.clone(),
            Value::Null => format!("HTTP {}", self.status),
            other => other.to_string(),
        }
    }
}

/// Capability to perform API requests
pub trait Transport {
    fn send(&self, request: Request) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport with basic authentication
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Same server, different account
    pub fn with_credentials(&self, username: &str, password: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> Result<Response> {
        if !request.path.starts_with('/') {
            return Err(Error::InvalidRequest(format!(
                "path must be absolute: {}",
                request.path
            )));
        }

        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        debug!("{} {} query={:?}", request.method, url, request.query);

        let mut builder = self
            .client
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!("{} {} -> {}", request.method, url, status);
        Ok(Response::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_full_messages() {
        let response = Response::new(
            422,
            json!({"error": {"message": "invalid", "full_messages": ["Name can't be blank"]}}),
        );
        assert_eq!(response.error_message(), "Name can't be blank");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(
            Response::new(404, json!({"message": "gone"})).error_message(),
            "gone"
        );
        assert_eq!(
            Response::new(500, Value::String("boom".into())).error_message(),
            "boom"
        );
        assert_eq!(Response::new(503, Value::Null).error_message(), "HTTP 503");
    }

    #[test]
    fn test_request_builders() {
        let request = Request::get("/api/media").with_query("search", "name = foo");
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.query_param("search"), Some("name = foo"));
        assert_eq!(request.query_param("page"), None);
    }

    #[test]
    fn test_http_transport_rejects_relative_path() {
        let transport = HttpTransport::new(&ServerConfig::default()).unwrap();
        let err = transport.send(Request::get("api/status")).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
