//! Error types for the launcher core.
//!
//! Launch-path errors carry the exact user-facing wording the UI shows, since
//! the launch controller turns them into `{success: false, message}` results.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the launcher core.
#[derive(Debug, Error)]
pub enum LauncherError {
    // Launch errors
    #[error("Invalid launch configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("Max clients reached ({limit})")]
    InstanceLimitReached { limit: u32 },

    #[error("Game executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("Failed to start game process: {message}")]
    SpawnFailed { executable: PathBuf, message: String },

    #[error("No window found for process {pid} after {attempts} attempts")]
    WindowNotFound { pid: u32, attempts: u32 },

    #[error("Window embedding failed: {message}")]
    EmbedFailed { message: String },

    #[error("Window operation {operation} failed on {handle:#x} (os error {code})")]
    WindowOperation {
        operation: &'static str,
        handle: isize,
        code: u32,
    },

    #[error("Process control failed for PID {pid}: {message}")]
    ProcessControl { pid: u32, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Update errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("SHA256 mismatch. Expected: {expected}, Got: {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Update cancelled")]
    UpdateCancelled,

    #[error("Update already in progress")]
    UpdateInProgress,

    #[error("No update manifest available")]
    NoManifest,

    #[error("Invalid or corrupted update archive: {message}")]
    Archive { message: String },

    // Validation errors
    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for launcher operations.
pub type Result<T> = std::result::Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(err: std::io::Error) -> Self {
        LauncherError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for LauncherError {
    fn from(err: serde_json::Error) -> Self {
        LauncherError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for LauncherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LauncherError::Timeout(std::time::Duration::from_secs(0))
        } else {
            LauncherError::Network {
                message: err.to_string(),
                cause: Some(err.to_string()),
            }
        }
    }
}

impl From<zip::result::ZipError> for LauncherError {
    fn from(err: zip::result::ZipError) -> Self {
        LauncherError::Archive {
            message: err.to_string(),
        }
    }
}

impl LauncherError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LauncherError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Network/connectivity error
    /// - -32001: Launch rejected (config, cap, missing executable)
    /// - -32002: Process or window control failure
    /// - -32003: Update failed
    /// - -32004: Cancelled by user
    /// - -32602: Invalid params
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            LauncherError::Network { .. } | LauncherError::Timeout(_) => -32000,

            LauncherError::ConfigInvalid { .. }
            | LauncherError::InstanceLimitReached { .. }
            | LauncherError::ExecutableNotFound(_)
            | LauncherError::SpawnFailed { .. } => -32001,

            LauncherError::WindowNotFound { .. }
            | LauncherError::EmbedFailed { .. }
            | LauncherError::WindowOperation { .. }
            | LauncherError::ProcessControl { .. } => -32002,

            LauncherError::HashMismatch { .. }
            | LauncherError::UpdateInProgress
            | LauncherError::NoManifest
            | LauncherError::Archive { .. } => -32003,

            LauncherError::UpdateCancelled => -32004,

            LauncherError::InvalidParams { .. } | LauncherError::Validation { .. } => -32602,

            // All other errors are internal errors
            _ => -32603,
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LauncherError::Network { .. } | LauncherError::Timeout(_)
        )
    }
}
