//! Collection of own error-related types

use std::{fmt, io, path::PathBuf};

/// Usage line printed when no target is given.
pub const USAGE: &str =
    "Usage: SyncthingWindowsLauncher <executable> [arguments...]";

/// Own error type
///
/// Every variant ends the launcher with [`FAILURE`](crate::FAILURE). The
/// [Display](fmt::Display) output is the exact line written to standard error.
#[derive(Debug)]
pub enum Error {
    /// No target was supplied on the command line
    Usage,
    /// The target does not exist and the shell fallback is disabled
    NotFound(PathBuf),
    /// The operating system refused to create the child process
    Spawn(io::Error),
    /// Any other [io::Error] while preparing or awaiting the child
    Io(io::Error),
    /// A [serde_json::Error] variant
    Json(serde_json::Error),
    /// Free-form failure message
    Str(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Usage => f.write_str(USAGE),
            Error::NotFound(ref path) => {
                write!(f, "Executable not found: {}", path.display())
            }
            Error::Spawn(_) => f.write_str("Failed to start process."),
            Error::Io(ref e) => write!(f, "Error: {e}"),
            Error::Json(ref e) => write!(f, "Error: {e}"),
            Error::Str(ref e) => write!(f, "Error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Spawn(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Own result type
///
/// This is result based on [Error]
pub type Result<T> = std::result::Result<T, Error>;
