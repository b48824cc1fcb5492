//! The single boundary where transport failures become [`DataError`] values.
//!
//! Nothing escapes [`safe_call`]: transport errors, undecodable bodies and
//! even a panic inside the operation all come back as `Err(DataError)`.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use sourcechat_shared::{ApiResult, DataError, NetworkError};
use tracing::{error, warn};

use crate::decode::decode_response;
use crate::envelope::{SuccessEnvelope, TransportResponse};

/// Failure raised by the transport before a response could be decoded.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request or response exceeded its deadline.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response body could not be read or decoded.
    #[error("failed to decode response body: {0}")]
    Deserialization(String),

    /// The connection could not be established (DNS, refused, TLS).
    #[error("connection failed: {0}")]
    Connect(String),

    /// Anything else the transport reports.
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() || e.is_body() {
            Self::Deserialization(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

impl TransportError {
    /// Taxonomy member for this failure.
    pub fn to_data_error(&self) -> DataError {
        let network = match self {
            Self::Timeout(_) => NetworkError::RequestTimeout,
            Self::Deserialization(_) => NetworkError::ServerError,
            Self::Connect(_) => NetworkError::NoInternet,
            Self::Other(_) => NetworkError::Unknown,
        };
        DataError::Network(network)
    }
}

/// Run `operation` and funnel every outcome into an [`ApiResult`].
///
/// On a normal return the response goes through [`decode_response`]; a
/// timeout short-circuits to [`NetworkError::RequestTimeout`] without
/// looking at any body.
pub async fn safe_call<T, F, Fut>(operation: F) -> ApiResult<SuccessEnvelope<T>>
where
    T: DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<TransportResponse, TransportError>>,
{
    let outcome = AssertUnwindSafe(async move { operation().await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(response)) => decode_response(&response),
        Ok(Err(transport)) => {
            let mapped = transport.to_data_error();
            warn!(error = %transport, %mapped, "transport failure");
            Err(mapped)
        }
        Err(_) => {
            error!("transport operation panicked");
            Err(DataError::Network(NetworkError::Unknown))
        }
    }
}
