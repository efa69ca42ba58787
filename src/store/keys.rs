//! Recognized configuration keys, their defaults and per-key validation.
//!
//! Keys missing from [`KEYS`] are passed through untouched; only the keys
//! listed here are type-checked.

use serde_json::{json, Value};
use sha2::{Digest, Sha256, Sha512};

use crate::store::Settings;

/// Key gating remote edits.
pub const GATE: &str = "configDialog";

/// Keys that must never leave the process through the read endpoint.
pub const REDACTED: &[&str] = &["password"];

/// Password applied when nothing else configures one.
const DEFAULT_PASSWORD: &str = "toor";

/// Value shape accepted for a recognized key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    /// Any string, empty included.
    Text,
    /// A string with at least one non-whitespace character.
    NonEmpty,
    /// A string or `null`.
    Nullable,
    /// An integer in the TCP port range.
    Port,
    /// One of a fixed set of identifiers.
    OneOf(&'static [&'static str]),
    /// A non-empty string stored as a digest, never in clear.
    Secret,
}

/// A recognized configuration key.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub name: &'static str,
    pub kind: Kind,
}

const fn key(name: &'static str, kind: Kind) -> KeySpec {
    KeySpec { name, kind }
}

pub const EDITORS: &[&str] = &["edward", "dword", "deepword"];
pub const PACKERS: &[&str] = &["tar", "zip"];
pub const COLUMNS: &[&str] = &["name-size-date-owner-mode", "name-size-date"];
pub const ALGORITHMS: &[&str] = &["sha512", "sha256"];

pub const KEYS: &[KeySpec] = &[
    key("auth", Kind::Bool),
    key("username", Kind::NonEmpty),
    key("password", Kind::Secret),
    key("algo", Kind::OneOf(ALGORITHMS)),
    key("editor", Kind::OneOf(EDITORS)),
    key("packer", Kind::OneOf(PACKERS)),
    key("diff", Kind::Bool),
    key("zip", Kind::Bool),
    key("buffer", Kind::Bool),
    key("dirStorage", Kind::Bool),
    key("online", Kind::Bool),
    key("open", Kind::Bool),
    key("oneFilePanel", Kind::Bool),
    key("keysPanel", Kind::Bool),
    key("port", Kind::Port),
    key("ip", Kind::Nullable),
    key("root", Kind::NonEmpty),
    key("prefix", Kind::Text),
    key("progress", Kind::Bool),
    key("contact", Kind::Bool),
    key("confirmCopy", Kind::Bool),
    key("confirmMove", Kind::Bool),
    key("configDialog", Kind::Bool),
    key("console", Kind::Bool),
    key("terminal", Kind::Bool),
    key("terminalPath", Kind::Text),
    key("showConfig", Kind::Bool),
    key("vim", Kind::Bool),
    key("columns", Kind::OneOf(COLUMNS)),
    key("log", Kind::Bool),
    key("name", Kind::Text),
];

/// Look up a recognized key by name.
pub fn lookup(name: &str) -> Option<&'static KeySpec> {
    KEYS.iter().find(|spec| spec.name == name)
}

/// Built-in defaults, the lowest layer of the effective configuration.
pub fn defaults() -> Settings {
    let value = json!({
        "auth": false,
        "username": "root",
        "password": hash_password(DEFAULT_PASSWORD, HashAlgo::Sha512),
        "algo": "sha512",
        "editor": "edward",
        "packer": "tar",
        "diff": true,
        "zip": true,
        "buffer": true,
        "dirStorage": true,
        "online": false,
        "open": false,
        "oneFilePanel": false,
        "keysPanel": true,
        "port": 8000,
        "ip": null,
        "root": "/",
        "prefix": "",
        "progress": true,
        "contact": true,
        "confirmCopy": true,
        "confirmMove": true,
        "configDialog": true,
        "console": true,
        "terminal": false,
        "terminalPath": "",
        "showConfig": false,
        "vim": false,
        "columns": "name-size-date-owner-mode",
        "log": true,
        "name": "",
    });

    match value {
        Value::Object(map) => map,
        _ => Settings::new(),
    }
}

/// Validate a single proposed value.
///
/// Returns the reason on failure. Unknown keys always pass.
pub fn check(name: &str, value: &Value) -> Result<(), String> {
    let Some(spec) = lookup(name) else {
        return Ok(());
    };

    let ok = match spec.kind {
        Kind::Bool => value.is_boolean(),
        Kind::Text => value.is_string(),
        Kind::NonEmpty | Kind::Secret => value
            .as_str()
            .is_some_and(|s| !s.trim().is_empty()),
        Kind::Nullable => value.is_null() || value.is_string(),
        Kind::Port => value
            .as_u64()
            .is_some_and(|port| port <= u64::from(u16::MAX)),
        Kind::OneOf(allowed) => value.as_str().is_some_and(|s| allowed.contains(&s)),
    };

    if ok {
        Ok(())
    } else {
        Err(describe(spec.kind))
    }
}

fn describe(kind: Kind) -> String {
    match kind {
        Kind::Bool => "must be a boolean".to_string(),
        Kind::Text => "must be a string".to_string(),
        Kind::NonEmpty | Kind::Secret => "must be a non-empty string".to_string(),
        Kind::Nullable => "must be a string or null".to_string(),
        Kind::Port => format!("must be an integer between 0 and {}", u16::MAX),
        Kind::OneOf(allowed) => format!("must be one of {}", allowed.join(", ")),
    }
}

/// Drop recognized keys whose stored value fails [`check`].
///
/// An invalid [`GATE`] value is replaced with `false` instead of dropped, so
/// a damaged file closes the gate rather than falling back to the default.
/// Returns every offending key with its reason.
pub fn sanitize(settings: &mut Settings) -> Vec<(String, String)> {
    let invalid: Vec<(String, String)> = settings
        .iter()
        .filter_map(|(name, value)| {
            check(name, value)
                .err()
                .map(|reason| (name.clone(), reason))
        })
        .collect();

    for (name, _) in &invalid {
        if name == GATE {
            settings.insert(GATE.to_string(), Value::Bool(false));
        } else {
            settings.remove(name);
        }
    }
    invalid
}

/// Whether `settings` permit remote edits: absent means open, anything
/// other than a boolean means closed.
pub fn edits_enabled(settings: &Settings) -> bool {
    match settings.get(GATE) {
        None => true,
        Some(value) => value.as_bool().unwrap_or(false),
    }
}

/// Whether `name` holds a secret that is stored hashed.
pub fn is_secret(name: &str) -> bool {
    lookup(name).is_some_and(|spec| spec.kind == Kind::Secret)
}

/// Remove keys that must not be served to clients.
pub fn redact(settings: &mut Settings) {
    for name in REDACTED {
        settings.remove(*name);
    }
}

/// Digest used for stored passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgo {
    #[default]
    Sha512,
    Sha256,
}

impl HashAlgo {
    /// Resolve the algorithm named by an `algo` setting, falling back to the default.
    pub fn from_setting(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("sha256") => HashAlgo::Sha256,
            _ => HashAlgo::Sha512,
        }
    }
}

/// Hex digest of `plain` under `algo`.
pub fn hash_password(plain: &str, algo: HashAlgo) -> String {
    match algo {
        HashAlgo::Sha512 => hex::encode(Sha512::digest(plain.as_bytes())),
        HashAlgo::Sha256 => hex::encode(Sha256::digest(plain.as_bytes())),
    }
}

/// Replace clear-text secrets in `fragment` with their digests.
///
/// The algorithm comes from `algo` in the fragment itself when present,
/// otherwise from `current`.
pub fn hash_secrets(fragment: &mut Settings, current: &Settings) {
    let algo = HashAlgo::from_setting(fragment.get("algo").or_else(|| current.get("algo")));

    for (name, value) in fragment.iter_mut() {
        if !is_secret(name) {
            continue;
        }
        if let Value::String(plain) = value {
            *plain = hash_password(plain, algo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_key() {
        let defaults = defaults();
        for spec in KEYS {
            let value = defaults.get(spec.name).unwrap();
            assert!(check(spec.name, value).is_ok(), "default for {} is invalid", spec.name);
        }
        assert_eq!(defaults.len(), KEYS.len());
    }

    #[test]
    fn test_auth_off_and_dialog_on_by_default() {
        let defaults = defaults();
        assert_eq!(defaults["auth"], json!(false));
        assert_eq!(defaults["configDialog"], json!(true));
        assert_eq!(defaults["ip"], Value::Null);
    }

    #[test]
    fn test_check_by_kind() {
        assert!(check("auth", &json!(true)).is_ok());
        assert!(check("auth", &json!("yes")).is_err());

        assert!(check("ip", &Value::Null).is_ok());
        assert!(check("ip", &json!("127.0.0.1")).is_ok());
        assert!(check("ip", &json!(1)).is_err());

        assert!(check("port", &json!(0)).is_ok());
        assert!(check("port", &json!(65535)).is_ok());
        assert!(check("port", &json!(65536)).is_err());
        assert!(check("port", &json!(-1)).is_err());

        assert!(check("prefix", &json!("")).is_ok());
        assert!(check("root", &json!("  ")).is_err());
    }

    #[test]
    fn test_editor_must_be_known() {
        assert!(check("editor", &json!("dword")).is_ok());
        assert_eq!(
            check("editor", &json!("")).unwrap_err(),
            "must be one of edward, dword, deepword"
        );
        assert!(check("editor", &json!(42)).is_err());
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        assert!(check("somethingNew", &json!({"nested": [1, 2]})).is_ok());
        assert!(check("somethingNew", &Value::Null).is_ok());
    }

    #[test]
    fn test_password_digest() {
        let digest = hash_password("toor", HashAlgo::Sha256);
        assert_eq!(digest.len(), 64);
        assert_eq!(hash_password("toor", HashAlgo::Sha512).len(), 128);
        assert_ne!(digest, "toor");
    }

    #[test]
    fn test_hash_secrets_uses_fragment_algo() {
        let mut fragment = Settings::new();
        fragment.insert("password".into(), json!("hunter2"));
        fragment.insert("algo".into(), json!("sha256"));

        hash_secrets(&mut fragment, &defaults());

        assert_eq!(fragment["password"], json!(hash_password("hunter2", HashAlgo::Sha256)));
        assert_eq!(fragment["algo"], json!("sha256"));
    }

    #[test]
    fn test_sanitize_closes_gate_on_bad_value() {
        let mut settings = Settings::new();
        settings.insert("configDialog".into(), json!("false"));
        settings.insert("editor".into(), json!(42));
        settings.insert("auth".into(), json!(true));
        settings.insert("somethingNew".into(), json!([1]));

        let invalid = sanitize(&mut settings);

        let names: Vec<&str> = invalid.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["configDialog", "editor"]);
        assert_eq!(settings["configDialog"], json!(false));
        assert!(!settings.contains_key("editor"));
        assert_eq!(settings["auth"], json!(true));
        assert_eq!(settings["somethingNew"], json!([1]));
    }

    #[test]
    fn test_edits_enabled() {
        let mut settings = Settings::new();
        assert!(edits_enabled(&settings));

        settings.insert(GATE.into(), json!(true));
        assert!(edits_enabled(&settings));

        settings.insert(GATE.into(), json!(false));
        assert!(!edits_enabled(&settings));

        settings.insert(GATE.into(), json!("true"));
        assert!(!edits_enabled(&settings));
    }

    #[test]
    fn test_redact_drops_password() {
        let mut settings = defaults();
        redact(&mut settings);
        assert!(!settings.contains_key("password"));
        assert!(settings.contains_key("auth"));
    }
}
