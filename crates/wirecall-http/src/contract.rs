//! The client contract shared by the real transport and the mock.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::encoder::RequestEncoder;
use crate::types::{HttpResult, RequestOptions};

/// Asynchronous HTTP client.
///
/// Every operation yields exactly one [`HttpResult`]. Network, status and
/// encoding failures come back as [`HttpFailure`](crate::HttpFailure) values.
///
/// The `*_encodable` methods are generic, so code that needs to swap
/// implementations should be generic over `C: HttpClient` rather than hold a
/// trait object.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, path: &str, options: RequestOptions) -> HttpResult;

    /// POST with a raw body. `None` sends no body.
    async fn post(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult;

    /// POST with `body` serialized by `encoder`.
    async fn post_encodable<B, E>(
        &self,
        path: &str,
        body: &B,
        encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder;

    async fn put(&self, path: &str, body: Option<Bytes>, options: RequestOptions) -> HttpResult;

    async fn put_encodable<B, E>(
        &self,
        path: &str,
        body: &B,
        encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder;

    async fn patch(&self, path: &str, body: Option<Bytes>, options: RequestOptions)
        -> HttpResult;

    async fn patch_encodable<B, E>(
        &self,
        path: &str,
        body: &B,
        encoder: &E,
        options: RequestOptions,
    ) -> HttpResult
    where
        B: Serialize + Sync + ?Sized,
        E: RequestEncoder;

    async fn delete(&self, path: &str, options: RequestOptions) -> HttpResult;
}
