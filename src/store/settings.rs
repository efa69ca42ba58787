//! The Config Store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use arc_swap::ArcSwap;

use crate::store::{file, keys, Settings, StoreError, UpdateReport};

/// Holds the effective configuration and serializes every mutation.
///
/// The persisted file is re-read on each access. Readers share the lock;
/// an update holds it exclusively from the file read through the write, so a
/// reader sees the configuration either before or after an update.
pub struct ConfigStore {
    path: PathBuf,
    defaults: Settings,
    overrides: Settings,
    /// Keys accepted by this process. Ranks above the overrides.
    accepted: RwLock<Settings>,
    /// Last persisted layer read or written successfully, served while the
    /// file is unreadable.
    last_persisted: ArcSwap<Settings>,
}

impl ConfigStore {
    /// Open the store backed by `path` with the given runtime overrides.
    ///
    /// Fails if an override carries an invalid value for a recognized key or
    /// if the file exists but cannot be parsed.
    pub fn open(path: impl Into<PathBuf>, mut overrides: Settings) -> Result<Self, StoreError> {
        let path = path.into();

        for (key, value) in &overrides {
            keys::check(key, value).map_err(|reason| StoreError::InvalidOverride {
                key: key.clone(),
                reason,
            })?;
        }

        let mut persisted = file::read(&path)?;
        report_invalid(&path, &keys::sanitize(&mut persisted));
        let defaults = keys::defaults();

        let current = merge(&[&defaults, &persisted]);
        keys::hash_secrets(&mut overrides, &current);

        tracing::info!(
            path = %path.display(),
            persisted_keys = persisted.len(),
            overrides = overrides.len(),
            "Config store opened"
        );

        Ok(Self {
            path,
            defaults,
            overrides,
            accepted: RwLock::new(Settings::new()),
            last_persisted: ArcSwap::from_pointee(persisted),
        })
    }

    /// Location of the persisted settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runtime overrides as supplied at construction.
    pub fn overrides(&self) -> &Settings {
        &self.overrides
    }

    /// Current merged view. Never fails.
    pub fn effective(&self) -> Settings {
        let accepted = self.accepted.read().unwrap_or_else(PoisonError::into_inner);
        let persisted = self.load_persisted();
        merge(&[&self.defaults, &persisted, &self.overrides, &*accepted])
    }

    /// The persisted layer alone.
    pub fn persisted(&self) -> Settings {
        let _guard = self.accepted.read().unwrap_or_else(PoisonError::into_inner);
        self.load_persisted()
    }

    /// Whether remote edits are permitted (`configDialog`).
    ///
    /// A gate value that is not a boolean counts as closed.
    pub fn edits_enabled(&self) -> bool {
        keys::edits_enabled(&self.effective())
    }

    /// Validate and apply a partial configuration.
    ///
    /// Fails with [`StoreError::Disabled`] when the gate is closed at the
    /// moment the update takes the lock, and with a read error when the file
    /// cannot be read, so an unreadable file is never overwritten. Every key
    /// is validated and reported. If any key is rejected the others are
    /// discarded and nothing is written. Otherwise the persisted layer merged
    /// with the fragment is written exactly once before the in-memory view
    /// changes.
    pub fn apply_update(&self, mut fragment: Settings) -> Result<UpdateReport, StoreError> {
        let mut accepted = self.accepted.write().unwrap_or_else(PoisonError::into_inner);

        let persisted = self.read_persisted().inspect_err(|e| {
            tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "Config update refused, settings file is unreadable"
            );
        })?;

        let current = merge(&[&self.defaults, &persisted, &self.overrides, &*accepted]);
        if !keys::edits_enabled(&current) {
            return Err(StoreError::Disabled);
        }

        let mut report = UpdateReport::default();
        for (key, value) in &fragment {
            match keys::check(key, value) {
                Ok(()) => report.applied(key.as_str()),
                Err(reason) => report.rejected(key.as_str(), reason),
            }
        }

        if !report.is_committed() {
            if !report.is_empty() {
                report.discard_applied();
                tracing::debug!(
                    rejected = report.rejections().count(),
                    "Config update rejected by validation"
                );
            }
            return Ok(report);
        }

        keys::hash_secrets(&mut fragment, &current);

        let next = merge(&[&persisted, &fragment]);
        file::write(&self.path, &next)?;
        self.last_persisted.store(Arc::new(next));

        let changed: Vec<&str> = report.applied_keys().collect();
        tracing::info!(keys = ?changed, path = %self.path.display(), "Config updated");

        accepted.extend(fragment);
        Ok(report)
    }

    /// Read and sanitize the file, remembering it as the last good content.
    fn read_persisted(&self) -> Result<Settings, StoreError> {
        let mut persisted = file::read(&self.path)?;
        report_invalid(&self.path, &keys::sanitize(&mut persisted));
        self.last_persisted.store(Arc::new(persisted.clone()));
        Ok(persisted)
    }

    fn load_persisted(&self) -> Settings {
        match self.read_persisted() {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(error = %e, "Serving last known settings file content");
                (**self.last_persisted.load()).clone()
            }
        }
    }
}

fn report_invalid(path: &Path, invalid: &[(String, String)]) {
    for (key, reason) in invalid {
        tracing::warn!(
            path = %path.display(),
            key = %key,
            reason = %reason,
            "Ignoring invalid value in settings file"
        );
    }
}

/// Shallow overlay, later layers win.
fn merge(layers: &[&Settings]) -> Settings {
    let mut merged = Settings::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyStatus;
    use serde_json::{json, Value};
    use std::fs;

    fn settings(value: Value) -> Settings {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn open(dir: &tempfile::TempDir, overrides: Value) -> ConfigStore {
        ConfigStore::open(dir.path().join("settings.json"), settings(overrides)).unwrap()
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));

        let config = store.effective();
        assert_eq!(config["auth"], json!(false));
        assert!(store.edits_enabled());
        assert!(store.persisted().is_empty());
    }

    #[test]
    fn test_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.json"),
            r#"{"editor": "deepword", "port": 9000, "custom": [1]}"#,
        )
        .unwrap();
        let store = open(&dir, json!({"port": 1234}));

        let config = store.effective();
        assert_eq!(config["editor"], json!("deepword"));
        assert_eq!(config["port"], json!(1234));
        assert_eq!(config["custom"], json!([1]));
        assert_eq!(config["vim"], json!(false));
    }

    #[test]
    fn test_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));

        let report = store
            .apply_update(settings(json!({"editor": "dword"})))
            .unwrap();
        assert_eq!(report.to_string(), r#"config: ok("editor")"#);

        let on_disk = file::read(store.path()).unwrap();
        assert_eq!(on_disk, settings(json!({"editor": "dword"})));
        assert_eq!(store.effective()["editor"], json!("dword"));
    }

    #[test]
    fn test_update_beats_override_without_persisting_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({"configDialog": true, "port": 1}));

        store
            .apply_update(settings(json!({"configDialog": false})))
            .unwrap();

        assert!(!store.edits_enabled());
        let on_disk = file::read(store.path()).unwrap();
        assert_eq!(on_disk, settings(json!({"configDialog": false})));
    }

    #[test]
    fn test_rejection_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"editor": "deepword"}"#).unwrap();
        let store = open(&dir, json!({}));

        let report = store
            .apply_update(settings(json!({"auth": true, "editor": ""})))
            .unwrap();

        assert!(!report.is_committed());
        assert_eq!(report.status("auth"), Some(&KeyStatus::Discarded));
        assert!(matches!(report.status("editor"), Some(KeyStatus::Rejected { .. })));
        assert_eq!(report.applied_keys().count(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"editor": "deepword"}"#);
        assert_eq!(store.effective()["auth"], json!(false));
    }

    #[test]
    fn test_password_is_hashed() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));

        store
            .apply_update(settings(json!({"password": "hunter2"})))
            .unwrap();

        let expected = keys::hash_password("hunter2", keys::HashAlgo::Sha512);
        assert_eq!(file::read(store.path()).unwrap()["password"], json!(expected));
    }

    #[test]
    fn test_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigStore::open(
            dir.path().join("settings.json"),
            settings(json!({"configDialog": "no"})),
        );
        assert!(matches!(result, Err(StoreError::InvalidOverride { .. })));
    }

    #[test]
    fn test_corrupt_file_serves_last_known() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));
        store.apply_update(settings(json!({"vim": true}))).unwrap();

        fs::write(store.path(), "{ truncated").unwrap();
        assert_eq!(store.effective()["vim"], json!(true));
    }

    #[test]
    fn test_corrupt_file_refuses_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));
        store.apply_update(settings(json!({"vim": true}))).unwrap();

        fs::write(store.path(), "{ hand edited").unwrap();
        let result = store.apply_update(settings(json!({"editor": "dword"})));

        assert!(matches!(result, Err(StoreError::Parse { .. })));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ hand edited");
        assert_eq!(store.effective()["editor"], json!("edward"));
    }

    #[test]
    fn test_invalid_file_values_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("settings.json"),
            r#"{"configDialog": "false", "editor": 42, "vim": true}"#,
        )
        .unwrap();
        let store = open(&dir, json!({}));

        let config = store.effective();
        assert_eq!(config["configDialog"], json!(false));
        assert_eq!(config["editor"], json!("edward"));
        assert_eq!(config["vim"], json!(true));
        assert!(!store.edits_enabled());
    }

    #[test]
    fn test_invalid_gate_written_later_closes_gate() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));
        assert!(store.edits_enabled());

        fs::write(store.path(), r#"{"configDialog": 0}"#).unwrap();
        assert!(!store.edits_enabled());
        assert!(matches!(
            store.apply_update(settings(json!({"vim": true}))),
            Err(StoreError::Disabled)
        ));
    }

    #[test]
    fn test_gate_rechecked_under_lock() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));

        store
            .apply_update(settings(json!({"configDialog": false})))
            .unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let result = store.apply_update(settings(json!({"configDialog": true, "auth": true})));

        assert!(matches!(result, Err(StoreError::Disabled)));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(store.effective()["auth"], json!(false));
    }

    #[tokio::test]
    async fn test_abandoned_update_still_commits() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open(&dir, json!({})));

        let task_store = store.clone();
        let handle = tokio::task::spawn_blocking(move || {
            task_store.apply_update(settings(json!({"editor": "dword"})))
        });
        drop(handle);

        for _ in 0..100 {
            if store.path().exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(file::read(store.path()).unwrap()["editor"], json!("dword"));
    }

    #[test]
    fn test_external_edits_are_observed() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir, json!({}));

        fs::write(store.path(), r#"{"terminal": true}"#).unwrap();
        assert_eq!(store.effective()["terminal"], json!(true));
    }

    #[test]
    fn test_concurrent_updates_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open(&dir, json!({})));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let mut fragment = Settings::new();
                    fragment.insert(format!("key{}", i), json!(i));
                    store.apply_update(fragment).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let on_disk = file::read(store.path()).unwrap();
        for i in 0..8 {
            assert_eq!(on_disk[&format!("key{}", i)], json!(i));
        }
    }
}
