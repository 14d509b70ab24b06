//! Cookie persistence - save and load cookie jars to/from disk.
//!
//! The file holds the jar's JSON document (see [`serialize`](crate::cookies::serialize)).
//! Saves go to a sibling `.tmp` file first and are renamed into place.

use crate::base::context::IoResultExt;
use crate::base::jarerror::{BoxError, JarError};
use crate::cookies::jar::CookieJar;
use crate::cookies::notifier::ChangeCallback;
use crate::cookies::options::CookieJarConfig;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Save every cookie in `jar`, session cookies included, to `path`.
///
/// # Example
/// ```ignore
/// persistence::save_jar(&jar, Path::new("/path/to/cookies.json"))?;
/// ```
pub fn save_jar(jar: &CookieJar, path: &Path) -> Result<(), JarError> {
    let json = jar.to_json_pretty()?;
    let tmp = tmp_path(path);

    fs::write(&tmp, json).persist_context(&tmp)?;
    fs::rename(&tmp, path).persist_context(path)
}

/// Load a jar from `path`, keeping persistent cookies only.
///
/// # Example
/// ```ignore
/// let path = Path::new("/path/to/cookies.json");
/// let jar = persistence::load_jar(path, CookieJarConfig::default())?;
/// ```
pub fn load_jar(path: &Path, config: CookieJarConfig) -> Result<CookieJar, JarError> {
    load_jar_with(path, config, false)
}

pub fn load_jar_with(
    path: &Path,
    config: CookieJarConfig,
    import_session_cookies: bool,
) -> Result<CookieJar, JarError> {
    let data = fs::read(path).persist_context(path)?;
    let jar = CookieJar::with_config(config);
    jar.import_json(&data, import_session_cookies)?;
    Ok(jar)
}

/// Like [`load_jar`], but a missing file yields an empty jar.
pub fn load_jar_or_default(path: &Path, config: CookieJarConfig) -> Result<CookieJar, JarError> {
    match fs::read(path) {
        Ok(data) => {
            let jar = CookieJar::with_config(config);
            jar.import_json(&data, false)?;
            Ok(jar)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no cookie file yet, starting empty");
            Ok(CookieJar::with_config(config))
        }
        Err(e) => Err(JarError::persist(path, e)),
    }
}

/// Change callback that saves the jar to `path` each time it fires.
///
/// # Example
/// ```ignore
/// let save = persistence::save_on_change("cookies.json");
/// jar.register_change_handler(save, Duration::from_secs(1))?;
/// ```
pub fn save_on_change(path: impl Into<PathBuf>) -> ChangeCallback {
    let path = path.into();
    Arc::new(move |jar: &CookieJar| save_jar(jar, &path).map_err(BoxError::from))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
