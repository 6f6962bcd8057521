use thiserror::Error;

/// Top-level error type for the timelog action.
///
/// The action crate defines its own error types for the launch pipeline;
/// this enum covers the shared kernel: configuration, I/O, serialization
/// and malformed events.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimelogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid event: {0}")]
    Event(String),
}

impl From<toml::de::Error> for TimelogError {
    fn from(err: toml::de::Error) -> Self {
        TimelogError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TimelogError {
    fn from(err: toml::ser::Error) -> Self {
        TimelogError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TimelogError {
    fn from(err: serde_json::Error) -> Self {
        TimelogError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for shared-kernel operations.
pub type Result<T> = std::result::Result<T, TimelogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimelogError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = TimelogError::Event("unknown topic".to_string());
        assert_eq!(err.to_string(), "Invalid event: unknown topic");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TimelogError = io_err.into();
        assert!(matches!(err, TimelogError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: TimelogError = json_err.into();
        assert!(matches!(err, TimelogError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: TimelogError = toml_err.into();
        assert!(matches!(err, TimelogError::Config(_)));
    }
}
