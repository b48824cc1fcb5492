//! User-facing text for [`DataError`] values.

use crate::error::{AuthError, DataError, LocalError, NetworkError, ProjectError, UserError};

/// Shown for any taxonomy member without a dedicated message.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

impl DataError {
    /// Display text for this error, shown once per failed call.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(e) => network_message(*e),
            Self::Auth(e) => auth_message(*e),
            Self::User(e) => user_message(*e),
            Self::Project(e) => project_message(*e),
            Self::Local(e) => local_message(*e),
        }
    }
}

fn network_message(e: NetworkError) -> &'static str {
    match e {
        NetworkError::RequestTimeout => "The request timed out. Check your connection.",
        NetworkError::Unauthorized => "Your session has expired. Please sign in again.",
        NetworkError::Conflict => "This change conflicts with the current state on the server.",
        NetworkError::TooManyRequests => "Too many requests. Please wait a moment.",
        NetworkError::NoInternet => "No internet connection.",
        NetworkError::PayloadTooLarge => "The file is too large to upload.",
        NetworkError::ServerError => "The server ran into a problem. Please try again later.",
        NetworkError::Serialization => "Could not read the server response.",
        NetworkError::EmptyResponse => "The server returned an empty response.",
        NetworkError::Unknown => FALLBACK_MESSAGE,
    }
}

fn auth_message(e: AuthError) -> &'static str {
    match e {
        AuthError::OtpMismatch => "The code you entered is incorrect.",
        AuthError::OtpExpired => "The code has expired. Request a new one.",
        AuthError::OtpNotFound => "No code was requested for this email.",
        AuthError::AccountDeactivated => "This account has been deactivated.",
        AuthError::UserCreationFailed => "We could not create your account.",
        AuthError::GoogleTokenInvalid => "Google sign-in failed. Please try again.",
        AuthError::InvalidRefreshToken
        | AuthError::JwtTokenExpired
        | AuthError::JwtTokenMalformed
        | AuthError::JwtTokenMissing
        | AuthError::JwtSignatureInvalid
        | AuthError::AccessTokenInvalid
        | AuthError::TokenBlacklisted => "Your session has expired. Please sign in again.",
        AuthError::AuthenticationFailed => "Authentication failed.",
        AuthError::AuthorizationFailed => "You are not allowed to do that.",
    }
}

fn user_message(e: UserError) -> &'static str {
    match e {
        UserError::ProfileNotFound => "Profile not found.",
        UserError::ProfileUpdateFailed => "Could not update your profile.",
        UserError::InvalidProfileData => "Some profile fields are invalid.",
        UserError::InsufficientPermissions => "You do not have permission to do that.",
        UserError::DuplicateEmail => "That email is already in use.",
    }
}

fn project_message(e: ProjectError) -> &'static str {
    match e {
        ProjectError::ProjectNotFound => "Project not found.",
        ProjectError::ProjectCreateFailed => "Could not create the project.",
        ProjectError::ProjectUpdateFailed => "Could not update the project.",
        ProjectError::ProjectDeleteFailed => "Could not delete the project.",
    }
}

fn local_message(e: LocalError) -> &'static str {
    match e {
        LocalError::DiskFull => "Not enough storage space.",
        LocalError::Unknown
        | LocalError::DuplicateData
        | LocalError::DatabaseFull
        | LocalError::SqlError => FALLBACK_MESSAGE,
    }
}
