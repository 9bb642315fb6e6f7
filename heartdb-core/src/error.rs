/// Structured error types for heartdb-core.
///
/// Library code returns these; the `heartdb` binary wraps them in `anyhow`
/// with extra context.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for heartdb-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reading a config file failed
    #[error("I/O error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML or has the wrong shape
    #[error("Invalid config file {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration value rejected
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for heartdb-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an I/O error tied to a path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::config("database uri must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: database uri must not be empty"
        );

        let err = CoreError::io(
            "/tmp/heartdb.toml",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/heartdb.toml"));
        assert!(err.to_string().contains("denied"));
    }
}
