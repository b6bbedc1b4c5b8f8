use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by every fallible operation of the store.
pub type Result<T> = std::result::Result<T, LocalizerError>;

/// Errors raised below the [`Localizer`](crate::Localizer) boundary.
///
/// Missing files and missing keys are not errors: files are created on
/// first access and absent keys come back as `None`.
#[derive(Debug, Error)]
pub enum LocalizerError {
    #[error("invalid culture token '{0}'")]
    InvalidCulture(String),
    #[error("resource keys must not be empty")]
    EmptyKey,
    #[error("I/O error on resource file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed resource file '{}': {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("resource file '{}' has unsupported version {version}", .path.display())]
    UnsupportedVersion { path: PathBuf, version: u32 },
}

impl LocalizerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
