//! reqwest-backed implementation of the client contract.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::contract::HttpClient;
use crate::encoder::RequestEncoder;
use crate::error::{ClientError, HttpFailure, TransportError};
use crate::types::{Headers, HttpResult, HttpSuccess, Method, RequestOptions, ResponseMeta};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Prefix for every request path. Paths must be absolute URLs when unset.
    pub base_url: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("wirecall/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

impl HttpConfig {
    /// Defaults overridden by `WIRECALL_HTTP_*` environment variables.
    ///
    /// Unparseable timeout values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("WIRECALL_HTTP_BASE_URL") {
            config.base_url = Some(base_url);
        }

        if let Some(secs) = env_secs("WIRECALL_HTTP_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = secs;
        }

        if let Some(secs) = env_secs("WIRECALL_HTTP_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = secs;
        }

        if let Ok(user_agent) = std::env::var("WIRECALL_HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        config
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Build a configured reqwest client.
pub fn build_client(config: &HttpConfig) -> Result<Client, ClientError> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host);

    if config.gzip {
        builder = builder.gzip(true);
    }

    builder.build().map_err(ClientError::Build)
}

struct Payload {
    data: Bytes,
    content_type: Option<String>,
}

impl Payload {
    fn raw(data: Bytes) -> Self {
        Self {
            data,
            content_type: None,
        }
    }

    fn encoded<B, E>(body: &B, encoder: &E) -> Result<Self, HttpFailure>
    where
        B: Serialize + ?Sized,
        E: RequestEncoder,
    {
        Ok(Self {
            data: encoder.encode(body)?,
            content_type: encoder.content_type().map(str::to_owned),
        })
    }
}

/// [`HttpClient`] that performs real network I/O.
#[derive(Debug, Clone)]
pub struct RestClient {
    inner: Client,
    base_url: Option<String>,
}

impl RestClient {
    /// Create a new client with default config.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new client with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self, ClientError> {
        if let Some(base_url) = &config.base_url {
            Url::parse(base_url).map_err(|source| ClientError::InvalidBaseUrl {
                url: base_url.clone(),
                source,
            })?;
        }

        let inner = build_client(&config)?;
        Ok(Self {
            inner,
            base_url: config.base_url,
        })
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Resolve `path` against the base URL and apply query items and fragment.
    pub fn url_for(&self, path: &str, options: &RequestOptions) -> Result<Url, url::ParseError> {
        let raw = match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        };
        let mut url = Url::parse(&raw)?;

        if let Some(items) = options.query_items.as_ref().filter(|items| !items.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in items {
                pairs.append_pair(name, value);
            }
        }

        url.set_fragment(options.fragment.as_deref());
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
        options: RequestOptions,
    ) -> HttpResult {
        let url = self.url_for(path, &options).map_err(TransportError::new)?;
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.inner.request(method.into(), url.clone());

        let mut has_content_type = false;
        if let Some(headers) = &options.headers {
            for (name, value) in headers {
                has_content_type |= name.eq_ignore_ascii_case(CONTENT_TYPE.as_str());
                request = request.header(name.as_str(), value.as_str());
            }
        }

        if let Some(directive) = options.cache_policy.and_then(|p| p.cache_control()) {
            request = request.header(CACHE_CONTROL, directive);
        }

        if let Some(payload) = payload {
            if let (Some(content_type), false) = (&payload.content_type, has_content_type) {
                request = request.header(CONTENT_TYPE, content_type.as_str());
            }
            request = request.body(payload.data);
        }

        let response = request.send().await?;
        let status = response.status();
        let meta = ResponseMeta {
            status: status.as_u16(),
            headers: collect_headers(response.headers()),
            url: Some(response.url().to_string()),
        };

        let data = response.bytes().await.map_err(|e| {
            if e.is_decode() {
                HttpFailure::InvalidResponse
            } else {
                HttpFailure::from(e)
            }
        })?;

        tracing::debug!(%method, %url, status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(HttpFailure::Server {
                status_code: status.as_u16(),
                data,
            });
        }

        Ok(HttpSuccess::new(data, meta))
    }

    async fn send_encodable<B, E>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder,
    {
        let payload = Payload::encoded(body, encoder).map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request body encoding failed");
            e
        })?;
        self.send(method, path, Some(payload), options).await
    }
}

fn collect_headers(map: &reqwest::header::HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}

#[async_trait]
impl HttpClient for RestClient {
    async fn get(&self, path: &str, options: RequestOptions) -> HttpResult {
        self.send(Method::Get, path, None, options).await
    }

    async fn post(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult {
        self.send(Method::Post, path, body.map(Payload::raw), options).await
    }

    async fn post_encodable<B, E>(
        &self,
        path: &str,
        body: &B,
        encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder,
    {
        self.send_encodable(Method::Post, path, body, encoder, options).await
    }

    async fn put(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult {
        self.send(Method::Put, path, body.map(Payload::raw), options).await
    }

    async fn put_encodable<B, E>(
        &self,
        path: &str,
        body: &B,
        encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder,
    {
        self.send_encodable(Method::Put, path, body, encoder, options).await
    }

    async fn patch(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult {
        self.send(Method::Patch, path, body.map(Payload::raw), options).await
    }

    async fn patch_encodable<B, E>(
        &self,
        path: &str,
        body: &B,
        encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder,
    {
        self.send_encodable(Method::Patch, path, body, encoder, options).await
    }

    async fn delete(&self, path: &str, options: RequestOptions) -> HttpResult {
        self.send(Method::Delete, path, None, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn client(base_url: &str) -> RestClient {
        RestClient::with_config(HttpConfig::default().with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert!(config.base_url.is_none());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("wirecall/"));
        assert_eq!(config.pool_max_idle_per_host, 10);
        assert!(config.gzip);
    }

    #[test]
    fn test_config_from_env() {
        let keys = [
            "WIRECALL_HTTP_BASE_URL",
            "WIRECALL_HTTP_CONNECT_TIMEOUT_SECS",
            "WIRECALL_HTTP_REQUEST_TIMEOUT_SECS",
            "WIRECALL_HTTP_USER_AGENT",
        ];
        let saved: Vec<_> = keys.iter().map(|k| (*k, env::var(k).ok())).collect();

        env::set_var("WIRECALL_HTTP_BASE_URL", "https://api.example.com");
        env::set_var("WIRECALL_HTTP_CONNECT_TIMEOUT_SECS", "3");
        env::set_var("WIRECALL_HTTP_REQUEST_TIMEOUT_SECS", "not-a-number");
        env::set_var("WIRECALL_HTTP_USER_AGENT", "test-agent");

        let config = HttpConfig::from_env();
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "test-agent");

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RestClient::with_config(HttpConfig::default().with_base_url("not a url"))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_url_for_joins_slashes() {
        let options = RequestOptions::new();
        let with_slash = client("https://api.example.com/v1/");
        let without_slash = client("https://api.example.com/v1");

        assert_eq!(
            with_slash.url_for("/users", &options).unwrap().as_str(),
            "https://api.example.com/v1/users"
        );
        assert_eq!(
            without_slash.url_for("users", &options).unwrap().as_str(),
            "https://api.example.com/v1/users"
        );
    }

    #[test]
    fn test_url_for_query_and_fragment() {
        let options = RequestOptions::new()
            .query("b", "2")
            .query("a", "x y")
            .fragment("frag");
        let url = client("https://api.example.com").url_for("/search", &options).unwrap();

        assert_eq!(url.as_str(), "https://api.example.com/search?a=x+y&b=2#frag");
    }

    #[test]
    fn test_url_for_empty_query_adds_nothing() {
        let options = RequestOptions::new().query_items(Default::default());
        let url = client("https://api.example.com").url_for("/x", &options).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/x");
    }

    #[test]
    fn test_url_for_without_base() {
        let client = RestClient::new().unwrap();
        let options = RequestOptions::new();

        assert_eq!(
            client.url_for("https://example.org/a", &options).unwrap().as_str(),
            "https://example.org/a"
        );
        assert!(client.url_for("/relative", &options).is_err());
    }

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut map = reqwest::header::HeaderMap::new();
        map.append("x-tag", "a".parse().unwrap());
        map.append("x-tag", "b".parse().unwrap());
        map.insert("content-type", "text/plain".parse().unwrap());

        let headers = collect_headers(&map);
        assert_eq!(headers["x-tag"], "a, b");
        assert_eq!(headers["content-type"], "text/plain");
    }
}
