//! Request inputs and response payloads shared by every client.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::HttpFailure;

/// Header name to value.
pub type Headers = BTreeMap<String, String>;

/// Query item name to value.
pub type QueryItems = BTreeMap<String, String>;

/// Outcome of every verb operation.
pub type HttpResult = Result<HttpSuccess, HttpFailure>;

/// HTTP verbs supported by [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case verb name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Cache behaviour requested from the transport.
///
/// Carries no meaning for the contract itself; [`RestClient`](crate::RestClient)
/// maps it to a `Cache-Control` request header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Let the transport and server decide.
    #[default]
    Default,
    /// Revalidate with the origin before using any cached copy.
    NoCache,
    /// Accept stale cached data rather than loading.
    PreferCache,
    /// Only use cached data, never hit the network.
    OnlyIfCached,
}

impl CachePolicy {
    /// `Cache-Control` value for this policy, if any.
    pub fn cache_control(self) -> Option<&'static str> {
        match self {
            CachePolicy::Default => None,
            CachePolicy::NoCache => Some("no-cache"),
            CachePolicy::PreferCache => Some("max-stale"),
            CachePolicy::OnlyIfCached => Some("only-if-cached"),
        }
    }
}

/// Optional inputs accepted by every verb.
///
/// Every field defaults to `None`. Setting an empty map is not the same as
/// leaving it unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Option<Headers>,
    pub query_items: Option<QueryItems>,
    pub fragment: Option<String>,
    pub cache_policy: Option<CachePolicy>,
}

impl RequestOptions {
    /// Options with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace all headers.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Add a query item.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_items
            .get_or_insert_with(QueryItems::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace all query items.
    pub fn query_items(mut self, query_items: QueryItems) -> Self {
        self.query_items = Some(query_items);
        self
    }

    /// Set the URL fragment.
    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Set the cache policy.
    pub fn cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = Some(cache_policy);
        self
    }
}

/// Response metadata, passed through untouched by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Headers,
    pub url: Option<String>,
}

impl ResponseMeta {
    /// Metadata with the given status and nothing else.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            url: None,
        }
    }
}

/// Payload of a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSuccess {
    data: Bytes,
    response: ResponseMeta,
}

impl HttpSuccess {
    pub fn new(data: impl Into<Bytes>, response: ResponseMeta) -> Self {
        Self {
            data: data.into(),
            response,
        }
    }

    /// Empty body, status 200, no headers, no url.
    pub fn empty() -> Self {
        Self::new(Bytes::new(), ResponseMeta::with_status(200))
    }

    /// Raw response body.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn response(&self) -> &ResponseMeta {
        &self.response
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }

    pub fn into_parts(self) -> (Bytes, ResponseMeta) {
        (self.data, self.response)
    }
}
