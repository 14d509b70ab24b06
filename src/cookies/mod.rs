//! Cookie storage, snapshot/restore and change notification.
//!
//! - **Storage**: in-memory jar ([`CookieJar`](jar::CookieJar)) keyed by host, then entry id
//! - **Serialization**: JSON document with session-cookie filtering on import
//! - **Notification**: debounced change callback ([`notifier`])
//! - **Persistence**: save/load to disk, save-on-change callback
//!
//! # Restore, then persist on every change
//!
//! ```rust,no_run
//! use cookieshelf::cookies::options::CookieJarConfig;
//! use cookieshelf::cookies::persistence;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), cookieshelf::base::jarerror::JarError> {
//! let path = Path::new("cookies.json");
//! let jar = persistence::load_jar_or_default(path, CookieJarConfig::default())?;
//! jar.register_change_handler(persistence::save_on_change(path), Duration::from_secs(1))?;
//!
//! let url = url::Url::parse("https://example.com/").unwrap();
//! jar.set_cookie_line(&url, "pref=dark; Max-Age=86400");
//! # Ok(())
//! # }
//! ```
//!
//! # Snapshot including session cookies
//!
//! ```rust
//! use cookieshelf::cookies::jar::CookieJar;
//!
//! let jar = CookieJar::new();
//! let url = url::Url::parse("https://example.com/").unwrap();
//! jar.set_cookie_line(&url, "sid=abc");
//!
//! let json = jar.to_json().unwrap();
//! let copy = CookieJar::new();
//! copy.import_json(json.as_bytes(), true).unwrap();
//! assert_eq!(copy.total_cookie_count(), 1);
//! ```

pub mod entry;
pub mod jar;
pub mod notifier;
pub mod options;
pub mod persistence;
pub mod psl;
pub mod serialize;
