//! Config Store: the effective configuration and its persistence.
//!
//! # Data Flow
//! ```text
//! keys::defaults()
//!     ⊕ persisted file (re-read on every access, file.rs; keys::sanitize)
//!     ⊕ runtime overrides (fixed at construction)
//!     ⊕ updates accepted by this process
//!     → effective configuration
//!
//! PATCH fragment
//!     → gate re-checked under the write lock
//!     → keys::check (per key, all keys reported)
//!     → persisted layer ⊕ fragment, written once (file.rs)
//!     → accepted layer updated
//! ```

pub mod file;
pub mod keys;
pub mod settings;

use std::fmt;

use thiserror::Error;

pub use settings::ConfigStore;

/// A configuration document: setting name to JSON value.
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// Errors raised by the Config Store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings file '{path}' must contain a JSON object")]
    NotAnObject { path: String },

    #[error("failed to write settings file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid runtime override '{key}': {reason}")]
    InvalidOverride { key: String, reason: String },

    #[error("config edits are disabled")]
    Disabled,
}

/// Outcome for one key of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Applied,
    Rejected { reason: String },
    /// Valid, but dropped because another key of the same update was rejected.
    Discarded,
}

/// Per-key result of [`ConfigStore::apply_update`], in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    entries: Vec<(String, KeyStatus)>,
}

impl UpdateReport {
    pub fn applied(&mut self, key: impl Into<String>) {
        self.entries.push((key.into(), KeyStatus::Applied));
    }

    pub fn rejected(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        self.entries.push((
            key.into(),
            KeyStatus::Rejected {
                reason: reason.into(),
            },
        ));
    }

    /// Mark every applied key as discarded.
    pub fn discard_applied(&mut self) {
        for (_, status) in &mut self.entries {
            if *status == KeyStatus::Applied {
                *status = KeyStatus::Discarded;
            }
        }
    }

    pub fn entries(&self) -> &[(String, KeyStatus)] {
        &self.entries
    }

    /// Status of `key`, if the update named it.
    pub fn status(&self, key: &str) -> Option<&KeyStatus> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, status)| status)
    }

    /// Keys applied by this update.
    pub fn applied_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, status)| *status == KeyStatus::Applied)
            .map(|(key, _)| key.as_str())
    }

    /// Rejected keys with their reasons.
    pub fn rejections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(key, status)| match status {
            KeyStatus::Rejected { reason } => Some((key.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Whether the update was written: at least one key, all applied.
    pub fn is_committed(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|(_, status)| *status == KeyStatus::Applied)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders the response body: `config: ok("a", "b")` when committed,
/// otherwise one line per key in request order, either
/// `config: rejected("key"): reason` or `config: discarded("key")`.
impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_committed() {
            write!(f, "config: ok(")?;
            for (i, key) in self.applied_keys().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "\"{}\"", key)?;
            }
            return write!(f, ")");
        }

        let mut first = true;
        for (key, status) in &self.entries {
            if !first {
                writeln!(f)?;
            }
            first = false;
            match status {
                KeyStatus::Rejected { reason } => {
                    write!(f, "config: rejected(\"{}\"): {}", key, reason)?
                }
                KeyStatus::Applied | KeyStatus::Discarded => {
                    write!(f, "config: discarded(\"{}\")", key)?
                }
            }
        }
        Ok(())
    }
}
