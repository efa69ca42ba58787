//! `key=value` assignments from the command line.

use serde_json::Value;

use crate::store::Settings;

/// Parse `key=value`. The value is read as JSON when it parses as JSON,
/// otherwise taken as a plain string (`editor=dword`).
pub fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Collect assignments into a fragment; later assignments win.
pub fn parse_assignments<'a, I>(raw: I) -> Result<Settings, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fragment = Settings::new();
    for item in raw {
        let (key, value) = parse_assignment(item)?;
        fragment.insert(key, value);
    }
    Ok(fragment)
}
