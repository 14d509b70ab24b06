//! Cookie jar snapshot and restore.
//!
//! The persisted document has exactly two fields:
//!
//! ```json
//! {
//!   "nextSeqNum": 3,
//!   "entries": {
//!     "a.com": {
//!       "a.com;/;pref": { "persistent": true, "sequenceNumber": 2, "name": "pref", ... }
//!     }
//!   }
//! }
//! ```
//!
//! Export never filters. Import replaces the jar's entries and sequence
//! counter wholesale; by default only persistent entries are kept, so a
//! restored jar starts without the previous process's session cookies.
//! An import document may carry `"importSessionCookies": true` to keep
//! them as well.

use crate::base::jarerror::JarError;
use crate::cookies::jar::{CookieJar, Entries};
use crate::cookies::options::CookieJarConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable snapshot of a jar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieDocument {
    pub next_seq_num: u64,
    pub entries: Entries,
}

/// Import-side view of [`CookieDocument`]: the same shape plus the
/// import-only filtering switch. Other top-level fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    next_seq_num: u64,
    entries: Entries,
    #[serde(default)]
    import_session_cookies: bool,
}

impl CookieDocument {
    /// Parse and validate a document. Nothing is applied to any jar.
    pub fn from_json(data: &[u8]) -> Result<Self, JarError> {
        let doc: ImportDocument = serde_json::from_slice(data)?;
        Ok(Self {
            next_seq_num: doc.next_seq_num,
            entries: doc.entries,
        })
    }

    pub fn cookie_count(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}

/// Keep only persistent entries, dropping hosts left empty.
pub fn filter_persistent(entries: Entries) -> Entries {
    entries
        .into_iter()
        .filter_map(|(host, submap)| {
            let kept: BTreeMap<_, _> =
                submap.into_iter().filter(|(_, entry)| entry.persistent).collect();
            (!kept.is_empty()).then_some((host, kept))
        })
        .collect()
}

impl CookieJar {
    /// Build a jar from `document`, keeping persistent entries only.
    pub fn from_document(document: CookieDocument, config: CookieJarConfig) -> Self {
        let jar = Self::with_config(config);
        jar.import_document(document, false);
        jar
    }

    /// Build a jar from a JSON document, keeping persistent entries only
    /// unless the document sets `importSessionCookies`.
    pub fn from_json(data: &[u8]) -> Result<Self, JarError> {
        Self::from_json_with_config(data, CookieJarConfig::default())
    }

    pub fn from_json_with_config(data: &[u8], config: CookieJarConfig) -> Result<Self, JarError> {
        let jar = Self::with_config(config);
        jar.import_json(data, false)?;
        Ok(jar)
    }

    /// Snapshot every stored entry and the sequence counter.
    pub fn export_document(&self) -> CookieDocument {
        self.with_entries(|store| {
            let doc = CookieDocument {
                next_seq_num: store.next_seq_num(),
                entries: store.entries().clone(),
            };
            tracing::debug!(
                hosts = doc.entries.len(),
                cookies = doc.cookie_count(),
                next_seq_num = doc.next_seq_num,
                "exported cookie jar"
            );
            doc
        })
    }

    pub fn to_json(&self) -> Result<String, JarError> {
        serde_json::to_string(&self.export_document())
            .map_err(|e| JarError::serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, JarError> {
        serde_json::to_string_pretty(&self.export_document())
            .map_err(|e| JarError::serialization(e.to_string()))
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, JarError> {
        serde_json::to_vec(&self.export_document())
            .map_err(|e| JarError::serialization(e.to_string()))
    }

    /// Replace the jar's entries and sequence counter with `document`.
    ///
    /// With `import_session_cookies` false only persistent entries are
    /// kept. The counter is taken from the document as-is either way.
    pub fn import_document(&self, document: CookieDocument, import_session_cookies: bool) {
        self.with_entries(|store| {
            let offered = document.cookie_count();
            let entries = if import_session_cookies {
                document.entries
            } else {
                filter_persistent(document.entries)
            };

            tracing::debug!(
                offered,
                kept = entries.values().map(BTreeMap::len).sum::<usize>(),
                import_session_cookies,
                next_seq_num = document.next_seq_num,
                "imported cookie jar"
            );
            store.replace(entries, document.next_seq_num);
        })
    }

    /// Parse `data` and replace the jar's state with it.
    ///
    /// Session cookies are kept if either `import_session_cookies` or the
    /// document's `importSessionCookies` field is set. A document that
    /// fails validation yields [`JarError::MalformedDocument`] and leaves
    /// the jar untouched.
    pub fn import_json(&self, data: &[u8], import_session_cookies: bool) -> Result<(), JarError> {
        self.with_entries(|store| {
            let doc: ImportDocument = serde_json::from_slice(data).map_err(|e| {
                tracing::debug!(error = %e, "rejected malformed cookie document");
                JarError::from(e)
            })?;

            let keep_session = import_session_cookies || doc.import_session_cookies;
            let offered: usize = doc.entries.values().map(BTreeMap::len).sum();
            let entries = if keep_session {
                doc.entries
            } else {
                filter_persistent(doc.entries)
            };

            tracing::debug!(
                offered,
                kept = entries.values().map(BTreeMap::len).sum::<usize>(),
                import_session_cookies = keep_session,
                next_seq_num = doc.next_seq_num,
                "imported cookie jar"
            );
            store.replace(entries, doc.next_seq_num);
            Ok(())
        })
    }
}
