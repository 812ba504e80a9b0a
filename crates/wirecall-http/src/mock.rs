//! Recording test double for [`HttpClient`].
//!
//! [`MockHttpClient`] never touches the network. Every invocation is
//! appended to a call log as a [`Call`], and the result configured for that
//! verb is handed back. Stubs are not queues: the same stub is returned for
//! every call of its verb until it is replaced.
//!
//! ```
//! use wirecall_http::{Call, HttpClient, HttpSuccess, MockHttpClient, RequestOptions};
//!
//! # tokio_test::block_on(async {
//! let client = MockHttpClient::new();
//! client.set_get_result(Ok(HttpSuccess::empty())).await;
//!
//! let result = client.get("/health", RequestOptions::new()).await;
//! assert!(result.is_ok());
//! assert_eq!(client.recorded_calls().await, vec![Call::get("/health")]);
//! # });
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::contract::HttpClient;
use crate::encoder::RequestEncoder;
use crate::types::{Headers, HttpResult, HttpSuccess, Method, QueryItems, RequestOptions};

/// One recorded invocation.
///
/// The `*Encodable` variants note that a body was supplied through an
/// encoder without keeping the value itself, so they compare on path,
/// headers, query items and fragment only. The cache policy is never
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        fragment: Option<String>,
    },
    Post {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        data: Option<Bytes>,
        fragment: Option<String>,
    },
    PostEncodable {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        fragment: Option<String>,
    },
    Put {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        data: Option<Bytes>,
        fragment: Option<String>,
    },
    PutEncodable {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        fragment: Option<String>,
    },
    Patch {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        data: Option<Bytes>,
        fragment: Option<String>,
    },
    PatchEncodable {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        fragment: Option<String>,
    },
    Delete {
        path: String,
        headers: Option<Headers>,
        query_items: Option<QueryItems>,
        fragment: Option<String>,
    },
}

impl Call {
    /// A bare `Get` with every option absent.
    pub fn get(path: impl Into<String>) -> Self {
        Call::Get {
            path: path.into(),
            headers: None,
            query_items: None,
            fragment: None,
        }
    }

    /// A bare `Delete` with every option absent.
    pub fn delete(path: impl Into<String>) -> Self {
        Call::Delete {
            path: path.into(),
            headers: None,
            query_items: None,
            fragment: None,
        }
    }

    /// Verb of the invocation.
    pub fn method(&self) -> Method {
        match self {
            Call::Get { .. } => Method::Get,
            Call::Post { .. } | Call::PostEncodable { .. } => Method::Post,
            Call::Put { .. } | Call::PutEncodable { .. } => Method::Put,
            Call::Patch { .. } | Call::PatchEncodable { .. } => Method::Patch,
            Call::Delete { .. } => Method::Delete,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Call::Get { path, .. }
            | Call::Post { path, .. }
            | Call::PostEncodable { path, .. }
            | Call::Put { path, .. }
            | Call::PutEncodable { path, .. }
            | Call::Patch { path, .. }
            | Call::PatchEncodable { path, .. }
            | Call::Delete { path, .. } => path,
        }
    }

    /// Whether the body went through an encoder.
    pub fn is_encodable(&self) -> bool {
        matches!(
            self,
            Call::PostEncodable { .. } | Call::PutEncodable { .. } | Call::PatchEncodable { .. }
        )
    }
}

#[derive(Debug, Default)]
struct Stubs {
    get: Option<HttpResult>,
    post: Option<HttpResult>,
    put: Option<HttpResult>,
    patch: Option<HttpResult>,
    delete: Option<HttpResult>,
}

impl Stubs {
    fn slot(&mut self, method: Method) -> &mut Option<HttpResult> {
        match method {
            Method::Get => &mut self.get,
            Method::Post => &mut self.post,
            Method::Put => &mut self.put,
            Method::Patch => &mut self.patch,
            Method::Delete => &mut self.delete,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    stubs: Stubs,
    calls: Vec<Call>,
}

/// [`HttpClient`] that records calls and returns stubbed results.
///
/// Stubs and the call log sit behind one async mutex, so recording a call
/// and reading its stub happen as a single step. Unconfigured verbs return
/// [`HttpSuccess::empty`].
#[derive(Debug, Default)]
pub struct MockHttpClient {
    state: Mutex<MockState>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_get_result(&self, result: HttpResult) {
        self.set_result(Method::Get, result).await;
    }

    pub async fn set_post_result(&self, result: HttpResult) {
        self.set_result(Method::Post, result).await;
    }

    pub async fn set_put_result(&self, result: HttpResult) {
        self.set_result(Method::Put, result).await;
    }

    pub async fn set_patch_result(&self, result: HttpResult) {
        self.set_result(Method::Patch, result).await;
    }

    pub async fn set_delete_result(&self, result: HttpResult) {
        self.set_result(Method::Delete, result).await;
    }

    /// Overwrite the stub for `method`.
    pub async fn set_result(&self, method: Method, result: HttpResult) {
        tracing::debug!(%method, ok = result.is_ok(), "stubbing mock result");
        *self.state.lock().await.stubs.slot(method) = Some(result);
    }

    /// Snapshot of every call so far, oldest first.
    pub async fn recorded_calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    /// Empty the call log. Stubs are kept.
    pub async fn clear_recorded_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    async fn record(&self, call: Call) -> HttpResult {
        let method = call.method();
        let mut state = self.state.lock().await;
        tracing::trace!(%method, path = call.path(), index = state.calls.len(), "recording mock call");
        state.calls.push(call);
        state
            .stubs
            .slot(method)
            .clone()
            .unwrap_or_else(|| Ok(HttpSuccess::empty()))
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, path: &str, options: RequestOptions) -> HttpResult {
        self.record(Call::Get {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            fragment: options.fragment,
        })
        .await
    }

    async fn post(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult {
        self.record(Call::Post {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            data: body,
            fragment: options.fragment,
        })
        .await
    }

    async fn post_encodable<B, E>(
        &self,
        path: &str,
        _body: &B,
        _encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder,
    {
        self.record(Call::PostEncodable {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            fragment: options.fragment,
        })
        .await
    }

    async fn put(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult {
        self.record(Call::Put {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            data: body,
            fragment: options.fragment,
        })
        .await
    }

    async fn put_encodable<B, E>(
        &self,
        path: &str,
        _body: &B,
        _encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder,
    {
        self.record(Call::PutEncodable {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            fragment: options.fragment,
        })
        .await
    }

    async fn patch(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult {
        self.record(Call::Patch {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            data: body,
            fragment: options.fragment,
        })
        .await
    }

    async fn patch_encodable<B, E>(
        &self,
        path: &str,
        _body: &B,
        _encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder,
    {
        self.record(Call::PatchEncodable {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            fragment: options.fragment,
        })
        .await
    }

    async fn delete(&self, path: &str, options: RequestOptions) -> HttpResult {
        self.record(Call::Delete {
            path: path.to_string(),
            headers: options.headers,
            query_items: options.query_items,
            fragment: options.fragment,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::JsonEncoder;
    use crate::error::HttpFailure;
    use crate::types::ResponseMeta;

    #[tokio::test]
    async fn test_fresh_mock_has_no_calls() {
        let client = MockHttpClient::new();
        assert!(client.recorded_calls().await.is_empty());
        assert_eq!(client.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_unset_stub_returns_empty_success() {
        let client = MockHttpClient::new();
        let result = client.delete("/gone", RequestOptions::new()).await;
        assert_eq!(result, Ok(HttpSuccess::empty()));
    }

    #[tokio::test]
    async fn test_stub_is_not_consumed() {
        let client = MockHttpClient::new();
        let stub = Ok(HttpSuccess::new(&b"abc"[..], ResponseMeta::with_status(201)));
        client.set_put_result(stub.clone()).await;

        for _ in 0..3 {
            assert_eq!(client.put("/x", None, RequestOptions::new()).await, stub);
        }
    }

    #[tokio::test]
    async fn test_stub_overwrite() {
        let client = MockHttpClient::new();
        client.set_patch_result(Err(HttpFailure::InvalidResponse)).await;
        client.set_patch_result(Ok(HttpSuccess::empty())).await;

        let result = client.patch("/x", None, RequestOptions::new()).await;
        assert_eq!(result, Ok(HttpSuccess::empty()));
    }

    #[tokio::test]
    async fn test_stubs_are_per_verb() {
        let client = MockHttpClient::new();
        client.set_get_result(Err(HttpFailure::InvalidResponse)).await;

        assert!(client.get("/a", RequestOptions::new()).await.is_err());
        assert!(client.post("/a", None, RequestOptions::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_encodable_body_is_not_recorded() {
        let client = MockHttpClient::new();
        let encoder = JsonEncoder::new();

        client
            .post_encodable("/items", &vec![1, 2, 3], &encoder, RequestOptions::new())
            .await
            .unwrap();
        client
            .post_encodable("/items", &"something else", &encoder, RequestOptions::new())
            .await
            .unwrap();

        let calls = client.recorded_calls().await;
        assert_eq!(calls[0], calls[1]);
        assert!(calls[0].is_encodable());
        assert_eq!(calls[0].method(), Method::Post);
    }

    #[tokio::test]
    async fn test_clear_keeps_stubs() {
        let client = MockHttpClient::new();
        client.set_get_result(Err(HttpFailure::InvalidResponse)).await;
        client.get("/a", RequestOptions::new()).await.unwrap_err();

        client.clear_recorded_calls().await;
        assert_eq!(client.call_count().await, 0);
        assert!(client.get("/a", RequestOptions::new()).await.is_err());
    }

    #[test]
    fn test_call_accessors() {
        let call = Call::Patch {
            path: "/p".to_string(),
            headers: None,
            query_items: None,
            data: Some(Bytes::from_static(b"d")),
            fragment: None,
        };
        assert_eq!(call.method(), Method::Patch);
        assert_eq!(call.path(), "/p");
        assert!(!call.is_encodable());
    }

    #[test]
    fn test_call_equality_depends_on_path() {
        assert_ne!(Call::get("x"), Call::get("y"));
        assert_eq!(Call::get("x"), Call::get("x"));
        assert_ne!(Call::get("x"), Call::delete("x"));
    }
}
