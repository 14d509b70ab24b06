use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// A single stored cookie, as held by the jar and written to the
/// persisted document.
///
/// Only `persistent` and `sequenceNumber` are required when decoding; the
/// matching fields default to empty and any field this type does not know
/// about is kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    /// "Strict", "Lax", "None" or empty when unspecified.
    #[serde(default)]
    pub same_site: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    /// True if the cookie carries an explicit expiry and should survive a
    /// restart. False for session cookies.
    pub persistent: bool,
    #[serde(default)]
    pub host_only: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub creation: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_access: Option<OffsetDateTime>,
    /// Ordering among cookies with equal path length; assigned by the jar.
    pub sequence_number: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CookieEntry {
    /// Session cookie with the given identity.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
            host_only: true,
            ..Self::default()
        }
    }

    /// Marks the entry persistent, expiring at `expires`.
    pub fn expiring_at(mut self, expires: OffsetDateTime) -> Self {
        self.persistent = true;
        self.expires = Some(expires);
        self
    }

    /// Key of this entry within its host submap.
    pub fn id(&self) -> String {
        format!("{};{};{}", self.domain, self.path, self.name)
    }

    /// Session cookies never expire on their own; they are dropped on a
    /// filtered import instead.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.persistent && self.expires.is_some_and(|at| at <= now)
    }
}
