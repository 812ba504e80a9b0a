//! HTTP client contract for wirecall, with a reqwest transport and a
//! recording test double.

pub mod client;
pub mod contract;
pub mod encoder;
pub mod error;
pub mod mock;
pub mod types;

pub use client::{build_client, HttpConfig, RestClient};
pub use contract::HttpClient;
pub use encoder::{JsonEncoder, RequestEncoder};
pub use error::{ClientError, EncodingError, HttpFailure, SharedError, TransportError};
pub use mock::{Call, MockHttpClient};
pub use types::{
    CachePolicy, Headers, HttpResult, HttpSuccess, Method, QueryItems, RequestOptions,
    ResponseMeta,
};
