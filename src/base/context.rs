//! Ergonomic error context helpers.
//!
//! Provides an extension trait for attaching the cookie file path to
//! `io::Result`s, converting them into `JarError::Persist`.

use crate::base::jarerror::JarError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add cookie file context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use cookieshelf::base::context::IoResultExt;
    ///
    /// let json = std::fs::read_to_string(path).persist_context(path)?;
    /// // Error: "Cookie file /tmp/cookies.json I/O failed: No such file or directory"
    /// ```
    fn persist_context(self, path: &Path) -> Result<T, JarError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn persist_context(self, path: &Path) -> Result<T, JarError> {
        self.map_err(|e| JarError::persist(path, e))
    }
}
