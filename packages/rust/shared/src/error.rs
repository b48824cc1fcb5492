//! Error types for SourceChat.
//!
//! Two families live here:
//! - [`DataError`]: the closed taxonomy every API call resolves to. It is
//!   a value, not a wrapper: callers branch on it, they never downcast.
//! - [`ClientError`]: infrastructure failures (config, I/O, storage) raised
//!   while assembling the client, before any request is made.
//!
//! App crates (cli) wrap both with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

// ---------------------------------------------------------------------------
// DataError taxonomy
// ---------------------------------------------------------------------------

/// Outcome of every API call: `Ok(value)` or a taxonomy member.
pub type ApiResult<T> = std::result::Result<T, DataError>;

/// An [`ApiResult`] for operations that carry no payload.
pub type EmptyResult = ApiResult<()>;

/// Domain error, tagged by namespace.
///
/// Each namespace is an independent enumeration; a value belongs to exactly
/// one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[serde(tag = "namespace", content = "kind", rename_all = "snake_case")]
pub enum DataError {
    /// Transport-level or HTTP-standard failure.
    #[error("network error: {0}")]
    Network(NetworkError),

    /// Authentication / token failure signalled by the backend.
    #[error("auth error: {0}")]
    Auth(AuthError),

    /// User-profile business error.
    #[error("user error: {0}")]
    User(UserError),

    /// Project business error.
    #[error("project error: {0}")]
    Project(ProjectError),

    /// Local persistence failure.
    #[error("local error: {0}")]
    Local(LocalError),
}

impl DataError {
    /// Whether this error means the current session can no longer be used.
    ///
    /// The transport client broadcasts a session-expired event for these.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Network(NetworkError::Unauthorized)
                | Self::Auth(
                    AuthError::JwtTokenExpired
                        | AuthError::JwtTokenMalformed
                        | AuthError::JwtTokenMissing
                        | AuthError::JwtSignatureInvalid
                        | AuthError::AccessTokenInvalid
                        | AuthError::TokenBlacklisted
                        | AuthError::InvalidRefreshToken
                )
        )
    }

    /// Namespace tag, as used in logs and JSON output.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::User(_) => "user",
            Self::Project(_) => "project",
            Self::Local(_) => "local",
        }
    }
}

/// Transport and HTTP-standard failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkError {
    RequestTimeout,
    Unauthorized,
    Conflict,
    TooManyRequests,
    NoInternet,
    PayloadTooLarge,
    ServerError,
    Serialization,
    EmptyResponse,
    Unknown,
}

impl NetworkError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestTimeout => "REQUEST_TIMEOUT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Conflict => "CONFLICT",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::NoInternet => "NO_INTERNET",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::ServerError => "SERVER_ERROR",
            Self::Serialization => "SERIALIZATION",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Authentication failures carried by application status codes 4001–4308.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthError {
    OtpMismatch,
    OtpExpired,
    OtpNotFound,
    AccountDeactivated,
    UserCreationFailed,
    InvalidRefreshToken,
    GoogleTokenInvalid,
    JwtTokenExpired,
    JwtTokenMalformed,
    JwtTokenMissing,
    JwtSignatureInvalid,
    AccessTokenInvalid,
    TokenBlacklisted,
    AuthenticationFailed,
    AuthorizationFailed,
}

impl AuthError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OtpMismatch => "OTP_MISMATCH",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpNotFound => "OTP_NOT_FOUND",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::UserCreationFailed => "USER_CREATION_FAILED",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::GoogleTokenInvalid => "GOOGLE_TOKEN_INVALID",
            Self::JwtTokenExpired => "JWT_TOKEN_EXPIRED",
            Self::JwtTokenMalformed => "JWT_TOKEN_MALFORMED",
            Self::JwtTokenMissing => "JWT_TOKEN_MISSING",
            Self::JwtSignatureInvalid => "JWT_SIGNATURE_INVALID",
            Self::AccessTokenInvalid => "ACCESS_TOKEN_INVALID",
            Self::TokenBlacklisted => "TOKEN_BLACKLISTED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::AuthorizationFailed => "AUTHORIZATION_FAILED",
        }
    }
}

/// User-profile failures (application codes 5001–5202).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserError {
    ProfileNotFound,
    ProfileUpdateFailed,
    InvalidProfileData,
    InsufficientPermissions,
    DuplicateEmail,
}

impl UserError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProfileNotFound => "PROFILE_NOT_FOUND",
            Self::ProfileUpdateFailed => "PROFILE_UPDATE_FAILED",
            Self::InvalidProfileData => "INVALID_PROFILE_DATA",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
        }
    }
}

/// Project failures (application codes 6001–6004).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectError {
    ProjectNotFound,
    ProjectCreateFailed,
    ProjectUpdateFailed,
    ProjectDeleteFailed,
}

impl ProjectError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::ProjectCreateFailed => "PROJECT_CREATE_FAILED",
            Self::ProjectUpdateFailed => "PROJECT_UPDATE_FAILED",
            Self::ProjectDeleteFailed => "PROJECT_DELETE_FAILED",
        }
    }
}

/// Local persistence failures. Never produced by the status-code mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalError {
    DiskFull,
    Unknown,
    DuplicateData,
    DatabaseFull,
    SqlError,
}

impl LocalError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiskFull => "DISK_FULL",
            Self::Unknown => "UNKNOWN",
            Self::DuplicateData => "DUPLICATE_DATA",
            Self::DatabaseFull => "DATABASE_FULL",
            Self::SqlError => "SQL_ERROR",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LocalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<NetworkError> for DataError {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

impl From<AuthError> for DataError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<UserError> for DataError {
    fn from(e: UserError) -> Self {
        Self::User(e)
    }
}

impl From<ProjectError> for DataError {
    fn from(e: ProjectError) -> Self {
        Self::Project(e)
    }
}

impl From<LocalError> for DataError {
    fn from(e: LocalError) -> Self {
        Self::Local(e)
    }
}

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

/// Infrastructure error raised while building or configuring the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// HTTP client construction error.
    #[error("network error: {0}")]
    Network(String),

    /// Credential database error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad URL, malformed email, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used for infrastructure operations.
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
