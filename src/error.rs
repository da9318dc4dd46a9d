use crate::api::{ApiFailure, PlatformError};
use crate::TOKEN_ENV;
use std::path::PathBuf;

/// Everything that can stop an upload, in the order the checks run.
/// The first failing check wins; none of them are retried.
#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("Error: file not found at path '{}'", .0.display())]
    FileNotFound(PathBuf),
    /// The path exists but this process cannot open it for reading.
    #[error("Error: cannot read file at path '{}': {}", .0.display(), .1)]
    FileUnreadable(PathBuf, #[source] std::io::Error),
    #[error("Error: environment variable '{}' is not set.", TOKEN_ENV)]
    MissingCredential,
    #[error("Authentication error: {0}")]
    AuthenticationFailure(String),
    #[error("VK API error: {0}")]
    RemoteApiFailure(ApiFailure),
    #[error("An unexpected error occurred: {0:#}")]
    Unexpected(anyhow::Error),
}

impl UploadError {
    /// Follow-up line telling the operator how to fix the problem, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            UploadError::MissingCredential => Some(format!(
                "Run 'export {}=\"your_token_here\"' before running this tool.",
                TOKEN_ENV
            )),
            UploadError::AuthenticationFailure(_) => Some(
                "Make sure your access token is valid and has the 'video' and 'wall' scopes."
                    .into(),
            ),
            _ => None,
        }
    }
}

impl From<PlatformError> for UploadError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Auth(failure) => UploadError::AuthenticationFailure(failure.to_string()),
            PlatformError::Api(failure) => UploadError::RemoteApiFailure(failure),
            PlatformError::Other(err) => UploadError::Unexpected(err),
        }
    }
}
