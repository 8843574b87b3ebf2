//! Error types and handling for the `SunRide` application

use thiserror::Error;

/// Main error type for the `SunRide` application
#[derive(Error, Debug)]
pub enum SunRideError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// GPX upload or parsing errors
    #[error("GPX error: {message}")]
    Gpx { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SunRideError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new GPX error
    pub fn gpx<S: Into<String>>(message: S) -> Self {
        Self::Gpx {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than by the system
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Gpx { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SunRideError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            SunRideError::Validation { message } => format!("Invalid input: {message}"),
            SunRideError::Gpx { message } => format!("Could not read GPX file: {message}"),
            SunRideError::Io { .. } => {
                "File operation failed. Please check the path and file permissions.".to_string()
            }
        }
    }
}
