use async_trait::async_trait;
use etsy_core::{ConfigError, Credentials};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://openapi.etsy.com/v3/application";

const API_KEY_HEADER: &str = "x-api-key";

/// One HTTP call against the marketplace, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Marketplace answered with a non-2xx status
    #[error("request failed with status code {status}")]
    Status { status: u16, body: Value },
    /// Request never got a response (DNS, connect, TLS, reading the body)
    #[error("network error: {0}")]
    Network(String),
    /// The request could not even be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Status and network failures become result envelopes; anything else is
    /// a bug and goes back to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransportError::Status { .. } | TransportError::Network(_)
        )
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue exactly one request and return the decoded 2xx body.
    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError>;
}

/// reqwest-backed transport bound to one base URL and one set of credentials.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(credentials: &Credentials, base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .default_headers(default_headers(credentials)?)
            .build()
            .map_err(|e| ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("HTTP client could not be built: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path)).map_err(|e| {
            TransportError::InvalidRequest(format!("bad URL for {}: {e}", request.path))
        })?;
        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &request.query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        let url = self.url_for(request)?;
        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            TransportError::Network(format!("failed to reach Etsy API at {}: {e}", self.base_url))
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read response body: {e}")))?;
        let body = parse_response_body(&bytes);

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Headers attached to every request: the API key always, the bearer token
/// only when one was configured.
pub fn default_headers(credentials: &Credentials) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    let mut api_key = HeaderValue::from_str(credentials.api_key())
        .map_err(|_| ConfigError::InvalidCredential { name: "ETSY_API_KEY" })?;
    api_key.set_sensitive(true);
    headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

    if let Some(token) = credentials.access_token() {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ConfigError::InvalidCredential {
                name: "ETSY_ACCESS_TOKEN",
            }
        })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
    }
    Ok(headers)
}

fn parse_response_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).to_string()))
}
