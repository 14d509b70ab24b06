use crate::base::jarerror::{BoxError, JarError};
use crate::cookies::entry::CookieEntry;
use crate::cookies::notifier::{ChangeCallback, ChangeNotifier};
use crate::cookies::options::CookieJarConfig;
use crate::cookies::psl;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::runtime::Handle;
use url::Url;

/// Host → entry key → entry.
pub type Entries = BTreeMap<String, BTreeMap<String, CookieEntry>>;

/// The jar's entry store together with its sequence counter.
///
/// Only reachable through [`CookieJar::with_entries`], so every access
/// holds the jar lock.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Entries,
    next_seq_num: u64,
    changed: bool,
}

impl EntryStore {
    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn next_seq_num(&self) -> u64 {
        self.next_seq_num
    }

    pub fn get(&self, host: &str, key: &str) -> Option<&CookieEntry> {
        self.entries.get(host).and_then(|submap| submap.get(key))
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Total number of entries across all hosts.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// True when no host holds any entry. Hosts with empty submaps, which an
    /// unfiltered import may restore, do not count.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }

    /// Store `entry` under `host`/`key` and return its sequence number.
    ///
    /// A new key takes the next sequence number. Replacing an existing key
    /// keeps the old entry's sequence number and creation time.
    pub fn insert(
        &mut self,
        host: impl Into<String>,
        key: impl Into<String>,
        mut entry: CookieEntry,
    ) -> u64 {
        let host = host.into();
        let key = key.into();

        match self.get(&host, &key) {
            Some(old) => {
                entry.sequence_number = old.sequence_number;
                entry.creation = old.creation;
            }
            None => {
                entry.sequence_number = self.allocate_seq_num();
                if entry.creation.is_none() {
                    entry.creation = Some(OffsetDateTime::now_utc());
                }
            }
        }

        let seq = entry.sequence_number;
        self.entries.entry(host).or_default().insert(key, entry);
        self.changed = true;
        seq
    }

    fn allocate_seq_num(&mut self) -> u64 {
        if self.next_seq_num == u64::MAX {
            self.renumber();
        }
        let seq = self.next_seq_num;
        self.next_seq_num += 1;
        seq
    }

    /// Reassign sequence numbers densely from zero, keeping the relative
    /// order of the stored entries. Used once the counter is exhausted.
    fn renumber(&mut self) {
        let mut ordered: Vec<&mut CookieEntry> =
            self.entries.values_mut().flat_map(BTreeMap::values_mut).collect();
        ordered.sort_by_key(|entry| entry.sequence_number);

        let count = ordered.len() as u64;
        for (seq, entry) in ordered.into_iter().enumerate() {
            entry.sequence_number = seq as u64;
        }

        tracing::warn!(
            entries = count,
            "cookie sequence counter exhausted, renumbered stored entries"
        );
        self.next_seq_num = count;
        self.changed = true;
    }

    /// Remove one entry. A host left without entries is dropped.
    pub fn remove(&mut self, host: &str, key: &str) -> Option<CookieEntry> {
        let submap = self.entries.get_mut(host)?;
        let removed = submap.remove(key);
        if submap.is_empty() {
            self.entries.remove(host);
        }
        if removed.is_some() {
            self.changed = true;
        }
        removed
    }

    /// Keep only the entries for which `keep` returns true. Returns the
    /// number of entries removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &CookieEntry) -> bool) -> usize {
        let before = self.len();
        self.entries.retain(|host, submap| {
            submap.retain(|_, entry| keep(host.as_str(), entry));
            !submap.is_empty()
        });
        let removed = before - self.len();
        if removed > 0 {
            self.changed = true;
        }
        removed
    }

    /// Remove every entry. The sequence counter keeps running.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.changed = true;
        }
    }

    pub(crate) fn replace(&mut self, entries: Entries, next_seq_num: u64) {
        self.entries = entries;
        self.next_seq_num = next_seq_num;
        self.changed = true;
    }

    fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

pub(crate) struct JarInner {
    pub(crate) store: Mutex<EntryStore>,
    pub(crate) notifier: ChangeNotifier,
    pub(crate) config: CookieJarConfig,
}

/// In-memory cookie jar with JSON snapshot/restore and debounced change
/// notification.
///
/// Cloning is cheap and yields another handle to the same jar.
#[derive(Clone)]
pub struct CookieJar {
    pub(crate) inner: Arc<JarInner>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar")
            .field("config", &self.inner.config)
            .field("cookies", &self.total_cookie_count())
            .field("change_pending", &self.is_change_pending())
            .finish()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self::with_config(CookieJarConfig::default())
    }

    pub fn with_config(config: CookieJarConfig) -> Self {
        Self {
            inner: Arc::new(JarInner {
                store: Mutex::new(EntryStore::default()),
                notifier: ChangeNotifier::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &CookieJarConfig {
        &self.inner.config
    }

    /// Run `f` with exclusive access to the entry store.
    ///
    /// This is the single critical section shared by export, import and
    /// every mutation. If `f` changed the store, the change notifier is
    /// poked once after the lock is released. `f` must not call back into
    /// the jar; the lock is not reentrant.
    pub fn with_entries<R>(&self, f: impl FnOnce(&mut EntryStore) -> R) -> R {
        let (result, changed) = {
            let mut store = self.inner.store.lock();
            store.changed = false;
            let result = f(&mut store);
            (result, store.take_changed())
        };

        if changed {
            self.inner.notifier.on_mutation(self);
        }
        result
    }

    /// Store `entry` under `host`, keyed by [`CookieEntry::id`].
    pub fn insert_entry(&self, host: &str, entry: CookieEntry) -> u64 {
        let key = entry.id();
        self.with_entries(|store| store.insert(host, key, entry))
    }

    pub fn remove_entry(&self, host: &str, key: &str) -> Option<CookieEntry> {
        self.with_entries(|store| store.remove(host, key))
    }

    pub fn get_entry(&self, host: &str, key: &str) -> Option<CookieEntry> {
        self.with_entries(|store| store.get(host, key).cloned())
    }

    /// Clear all cookies.
    pub fn clear(&self) {
        self.with_entries(EntryStore::clear)
    }

    /// Drop persistent entries that expired at or before `now`.
    pub fn remove_expired(&self, now: OffsetDateTime) -> usize {
        self.with_entries(|store| store.retain(|_, entry| !entry.is_expired(now)))
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn next_seq_num(&self) -> u64 {
        self.inner.store.lock().next_seq_num()
    }

    /// Parse a `Set-Cookie` line received from `url` and store it.
    ///
    /// Expiry comes from `Max-Age`, falling back to `Expires`; a cookie with
    /// either is persistent. An already-expired cookie deletes any stored
    /// cookie with the same identity. Returns whether the jar changed.
    pub fn set_cookie_line(&self, url: &Url, cookie_line: &str) -> bool {
        use cookie::Cookie;

        let parsed = match Cookie::parse(cookie_line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparsable Set-Cookie line");
                return false;
            }
        };

        let request_host = url.host_str().unwrap_or("").to_lowercase();
        if request_host.is_empty() {
            return false;
        }

        let (domain, host_only) = match parsed.domain() {
            Some(d) => {
                let d = d.trim_start_matches('.').to_lowercase();
                if !psl::is_valid_cookie_domain(&d, &request_host) {
                    tracing::debug!(domain = %d, host = %request_host, "rejected cookie domain");
                    return false;
                }
                (d, false)
            }
            None => (request_host.clone(), true),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url),
        };

        let now = OffsetDateTime::now_utc();
        let expires = match parsed.max_age() {
            Some(max_age) if max_age.is_positive() => {
                Some(now.checked_add(max_age).unwrap_or(PrimitiveDateTime::MAX.assume_utc()))
            }
            Some(_) => Some(now),
            None => parsed.expires_datetime(),
        };

        let mut entry = CookieEntry::new(parsed.name(), parsed.value(), domain, path);
        entry.host_only = host_only;
        entry.secure = parsed.secure().unwrap_or(false);
        entry.http_only = parsed.http_only().unwrap_or(false);
        entry.same_site = parsed.same_site().map(|s| s.to_string()).unwrap_or_default();
        entry.last_access = Some(now);
        if let Some(at) = expires {
            entry = entry.expiring_at(at);
        }

        let host = psl::jar_key(&request_host, self.inner.config.use_public_suffix_list);
        let key = entry.id();

        if entry.is_expired(now) {
            return self.remove_entry(&host, &key).is_some();
        }

        self.with_entries(|store| store.insert(host, key, entry));
        true
    }

    /// Register `callback` to run after cookie changes settle for
    /// `interval`. Replaces any previous registration and discards a
    /// pending notification.
    ///
    /// The callback runs on the runtime's blocking pool and may do
    /// synchronous I/O.
    pub fn register_change_callback<F>(
        &self,
        callback: F,
        interval: Duration,
    ) -> Result<(), JarError>
    where
        F: Fn(&CookieJar) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register_change_handler(Arc::new(callback), interval)
    }

    pub fn register_change_handler(
        &self,
        callback: ChangeCallback,
        interval: Duration,
    ) -> Result<(), JarError> {
        let runtime = match &self.inner.config.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| JarError::RuntimeUnavailable)?,
        };

        self.inner.notifier.register(callback, interval, runtime);
        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            "cookie change callback registered"
        );
        Ok(())
    }

    /// Remove the change callback, discarding any pending notification.
    pub fn clear_change_callback(&self) {
        self.inner.notifier.unregister();
    }

    /// True while a debounced notification is waiting to fire.
    pub fn is_change_pending(&self) -> bool {
        self.inner.notifier.is_armed()
    }

    pub(crate) fn notifier(&self) -> &ChangeNotifier {
        &self.inner.notifier
    }

    pub(crate) fn downgrade(&self) -> WeakCookieJar {
        WeakCookieJar(Arc::downgrade(&self.inner))
    }
}

/// Non-owning jar handle held by pending timers.
pub(crate) struct WeakCookieJar(Weak<JarInner>);

impl WeakCookieJar {
    pub(crate) fn upgrade(&self) -> Option<CookieJar> {
        self.0.upgrade().map(|inner| CookieJar { inner })
    }
}

/// RFC 6265 default-path: the request path up to, not including, its
/// last '/'.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}
