//! # cookieshelf
//!
//! A cookie jar that survives restarts.
//!
//! `cookieshelf` keeps HTTP cookies in memory and adds two things a plain
//! jar lacks: a JSON snapshot/restore format that can drop session cookies
//! on the way back in, and a debounced change callback so the snapshot can
//! be written out after cookie activity settles instead of on every
//! `Set-Cookie`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cookieshelf::cookies::jar::CookieJar;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let jar = CookieJar::new();
//!     jar.register_change_callback(
//!         |jar| {
//!             std::fs::write("cookies.json", jar.to_json()?)?;
//!             Ok(())
//!         },
//!         Duration::from_millis(500),
//!     )
//!     .unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types and I/O context helpers
//! - [`cookies`] - Jar, serialization, change notification, persistence

pub mod base;
pub mod cookies;

pub use base::jarerror::JarError;
pub use cookies::entry::CookieEntry;
pub use cookies::jar::CookieJar;
pub use cookies::options::CookieJarConfig;
pub use cookies::serialize::CookieDocument;
