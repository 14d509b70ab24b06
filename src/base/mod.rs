//! Base types and error handling.
//!
//! - [`JarError`](jarerror::JarError): error taxonomy for the cookie jar
//! - [`IoResultExt`](context::IoResultExt): path context for cookie file I/O

pub mod context;
pub mod jarerror;

#[cfg(test)]
mod tests;
