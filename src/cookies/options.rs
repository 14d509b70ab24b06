//! Cookie jar configuration.

use tokio::runtime::Handle;

/// Configuration options for [`CookieJar`](crate::cookies::jar::CookieJar).
#[derive(Debug, Clone)]
pub struct CookieJarConfig {
    /// Key hosts by registrable domain (eTLD+1) rather than by their last
    /// two labels.
    pub use_public_suffix_list: bool,

    /// Runtime that drives debounce timers. When `None` the runtime current
    /// at callback registration is used.
    pub runtime: Option<Handle>,
}

impl Default for CookieJarConfig {
    fn default() -> Self {
        Self {
            use_public_suffix_list: true,
            runtime: None,
        }
    }
}

impl CookieJarConfig {
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn without_public_suffix_list(mut self) -> Self {
        self.use_public_suffix_list = false;
        self
    }
}
