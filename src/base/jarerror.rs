use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by change callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum JarError {
    /// The import document does not have the expected shape.
    /// Raised before any jar state is touched.
    #[error("Malformed cookie document: {message}")]
    MalformedDocument { message: String },

    /// A registered change callback returned an error.
    /// Only ever logged, never returned to a mutating caller.
    #[error("Cookie change callback failed: {source}")]
    CallbackFailure {
        #[source]
        source: BoxError,
    },

    #[error("Failed to encode cookie document: {message}")]
    Serialization { message: String },

    #[error("Cookie file {} I/O failed: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("No tokio runtime available to schedule change notifications")]
    RuntimeUnavailable,
}

impl JarError {
    pub fn malformed(message: impl Into<String>) -> Self {
        JarError::MalformedDocument {
            message: message.into(),
        }
    }

    pub fn callback_failure(source: BoxError) -> Self {
        JarError::CallbackFailure { source }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        JarError::Serialization {
            message: message.into(),
        }
    }

    pub fn persist(path: impl Into<PathBuf>, source: io::Error) -> Self {
        JarError::Persist {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// True for errors that leave the jar untouched and may be retried
    /// with a corrected input.
    pub fn is_malformed(&self) -> bool {
        matches!(self, JarError::MalformedDocument { .. })
    }
}

impl From<serde_json::Error> for JarError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Io => JarError::serialization(err.to_string()),
            Category::Syntax | Category::Data | Category::Eof => {
                JarError::malformed(err.to_string())
            }
        }
    }
}
