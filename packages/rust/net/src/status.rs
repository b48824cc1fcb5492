//! Application / HTTP status code → [`DataError`] mapping.
//!
//! The exact-code table is the compatibility surface with the backend. Do not
//! change a row without a matching server-side change.

use sourcechat_shared::{AuthError, DataError, NetworkError, ProjectError, UserError};

/// Application codes that fall in this range but are not listed map to
/// [`AuthError::AuthenticationFailed`].
const AUTH_RANGE: std::ops::RangeInclusive<i32> = 4000..=4399;

/// Exact application status codes, in table order.
pub const APPLICATION_CODES: &[(i32, DataError)] = &[
    (4001, DataError::Auth(AuthError::AuthenticationFailed)),
    (4002, DataError::Auth(AuthError::AuthorizationFailed)),
    (4101, DataError::Auth(AuthError::OtpMismatch)),
    (4102, DataError::Auth(AuthError::OtpExpired)),
    (4103, DataError::Auth(AuthError::OtpNotFound)),
    (4201, DataError::Auth(AuthError::AccountDeactivated)),
    (4202, DataError::Auth(AuthError::UserCreationFailed)),
    (4301, DataError::Auth(AuthError::InvalidRefreshToken)),
    (4302, DataError::Auth(AuthError::GoogleTokenInvalid)),
    (4303, DataError::Auth(AuthError::JwtTokenExpired)),
    (4304, DataError::Auth(AuthError::JwtTokenMalformed)),
    (4305, DataError::Auth(AuthError::JwtTokenMissing)),
    (4306, DataError::Auth(AuthError::JwtSignatureInvalid)),
    (4307, DataError::Auth(AuthError::AccessTokenInvalid)),
    (4308, DataError::Auth(AuthError::TokenBlacklisted)),
    (5001, DataError::User(UserError::ProfileNotFound)),
    (5002, DataError::User(UserError::ProfileUpdateFailed)),
    (5003, DataError::User(UserError::InvalidProfileData)),
    (5101, DataError::User(UserError::InsufficientPermissions)),
    (5202, DataError::User(UserError::DuplicateEmail)),
    (6001, DataError::Project(ProjectError::ProjectNotFound)),
    (6002, DataError::Project(ProjectError::ProjectCreateFailed)),
    (6003, DataError::Project(ProjectError::ProjectUpdateFailed)),
    (6004, DataError::Project(ProjectError::ProjectDeleteFailed)),
];

/// Map a status code to a taxonomy member. Total over `i32`.
///
/// Priority: exact application code, then the auth catch-all range,
/// then standard HTTP semantics, then [`NetworkError::Unknown`].
pub fn map_status_code(code: i32) -> DataError {
    if let Some(error) = exact_application_code(code) {
        return error;
    }

    if AUTH_RANGE.contains(&code) {
        return DataError::Auth(AuthError::AuthenticationFailed);
    }

    let network = match code {
        401 => NetworkError::Unauthorized,
        408 => NetworkError::RequestTimeout,
        409 => NetworkError::Conflict,
        413 => NetworkError::PayloadTooLarge,
        429 => NetworkError::TooManyRequests,
        500..=599 => NetworkError::ServerError,
        _ => NetworkError::Unknown,
    };
    DataError::Network(network)
}

fn exact_application_code(code: i32) -> Option<DataError> {
    APPLICATION_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, error)| *error)
}
