use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A unique constraint enforced by the backend rejected the write.
    #[error("duplicate value: {message}")]
    Duplicate { message: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct an unavailable error whose message carries `source` and every error below it.
    pub fn from_backend(source: impl Error + Send + Sync + 'static) -> Self {
        let message = error_chain(&source);
        StorageError::unavailable(message, source)
    }

    /// Construct a duplicate error for a value that must stay unique.
    pub fn duplicate(message: impl Into<String>) -> Self {
        StorageError::Duplicate {
            message: message.into(),
        }
    }
}

/// Render an error followed by its sources, separated by `: `.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        current = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("failed to load `abc` from `games`")]
    struct LoadFailed {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn backend_failures_keep_the_driver_message() {
        let err = StorageError::from_backend(LoadFailed {
            source: std::io::Error::other("server selection timeout"),
        });

        assert_eq!(
            err.to_string(),
            "storage unavailable: failed to load `abc` from `games`: server selection timeout"
        );
    }
}
