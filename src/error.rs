//! Error types and handling for helianthus-io

/// Result type alias for helianthus-io operations
pub type Result<T> = std::result::Result<T, HelianthusError>;

/// Error types for the zero-copy I/O substrate
#[derive(Debug, thiserror::Error)]
pub enum HelianthusError {
    /// I/O related errors (file operations, stat, etc.)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Memory allocation failures
    #[error("Memory error: {message}")]
    Memory { message: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Memory mapping failures (bad path, out-of-range window, OS refusal)
    #[error("Mapping error for {path}: {message}")]
    Mapping { path: String, message: String },

    /// Insufficient space for allocation
    #[error("Insufficient space: requested {requested}, available {available}")]
    InsufficientSpace { requested: usize, available: usize },

    /// Platform-specific errors
    #[error("Platform error: {message}")]
    Platform { message: String },
}

impl HelianthusError {
    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create a memory error
    pub fn memory(message: impl Into<String>) -> Self {
        Self::Memory {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a mapping error
    pub fn mapping(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an insufficient space error
    pub fn insufficient_space(requested: usize, available: usize) -> Self {
        Self::InsufficientSpace {
            requested,
            available,
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for HelianthusError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}
