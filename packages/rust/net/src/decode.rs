//! Turns a raw [`TransportResponse`] into an [`ApiResult`].

use serde::de::DeserializeOwned;
use sourcechat_shared::{ApiResult, DataError, NetworkError};
use tracing::{debug, warn};

use crate::envelope::{ErrorEnvelope, SuccessEnvelope, TransportResponse};
use crate::status::map_status_code;

/// Maximum body characters echoed into logs.
const PREVIEW_CHAR_LIMIT: usize = 160;

/// Decode a transport response into a success envelope or a taxonomy error.
///
/// - 2xx with a `success: true` envelope → `Ok(envelope)`.
/// - 2xx with a `success: false` envelope → error mapped from its `status`.
/// - 2xx with an empty or unparseable body → [`NetworkError::EmptyResponse`].
/// - non-2xx → error mapped from the error envelope's `status`, or from the
///   HTTP status line when the body is not an error envelope.
pub fn decode_response<T>(response: &TransportResponse) -> ApiResult<SuccessEnvelope<T>>
where
    T: DeserializeOwned,
{
    if response.is_success() {
        decode_success(response)
    } else {
        Err(decode_failure(response))
    }
}

fn decode_success<T>(response: &TransportResponse) -> ApiResult<SuccessEnvelope<T>>
where
    T: DeserializeOwned,
{
    if response.is_body_empty() {
        warn!(status = response.status, "empty response body");
        return Err(DataError::Network(NetworkError::EmptyResponse));
    }

    match serde_json::from_slice::<SuccessEnvelope<T>>(&response.body) {
        Ok(envelope) if envelope.success => {
            debug!(
                status = response.status,
                app_status = envelope.status,
                bytes = response.body.len(),
                "response ok"
            );
            Ok(envelope)
        }
        Ok(envelope) => {
            let error = map_status_code(envelope.status);
            warn!(
                status = response.status,
                app_status = envelope.status,
                message = %envelope.message,
                %error,
                "envelope reported failure"
            );
            Err(error)
        }
        Err(e) => {
            warn!(
                status = response.status,
                error = %e,
                body = %body_preview(&response.body),
                "unparseable success body"
            );
            Err(DataError::Network(NetworkError::EmptyResponse))
        }
    }
}

fn decode_failure(response: &TransportResponse) -> DataError {
    let http_status = i32::from(response.status);

    let code = if response.is_body_empty() {
        http_status
    } else {
        match serde_json::from_slice::<ErrorEnvelope>(&response.body) {
            Ok(envelope) => envelope.status,
            Err(e) => {
                debug!(error = %e, "error body is not an envelope, using HTTP status");
                http_status
            }
        }
    };

    let error = map_status_code(code);
    warn!(
        status = response.status,
        resolved_code = code,
        %error,
        body = %body_preview(&response.body),
        "request failed"
    );
    error
}

/// Whitespace-collapsed, truncated view of a body for logs.
fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
