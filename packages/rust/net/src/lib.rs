//! HTTP transport and result pipeline for the SourceChat API.
//!
//! Leaf first:
//! - [`status`]: application/HTTP status code → [`DataError`] table
//! - [`envelope`]: success and error wire envelopes
//! - [`decode`]: transport response → `ApiResult<SuccessEnvelope<T>>`
//! - [`safe_call`]: the boundary that turns every transport failure into a
//!   [`DataError`]
//! - [`client`]: reqwest client with bearer attachment
//! - [`session`]: session-expired broadcast
//!
//! [`DataError`]: sourcechat_shared::DataError

pub mod client;
pub mod decode;
pub mod envelope;
pub mod safe_call;
pub mod session;
pub mod status;

pub use client::{ApiClient, is_public_path};
pub use decode::decode_response;
pub use envelope::{ErrorEnvelope, SuccessEnvelope, TransportResponse};
pub use safe_call::{TransportError, safe_call};
pub use session::{SessionEvent, SessionEvents};
pub use status::{APPLICATION_CODES, map_status_code};
