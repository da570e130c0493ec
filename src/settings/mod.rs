//! Test setting resolution
//!
//! Decides whether a batch run request targets a single run or a cross
//! batch run, and merges the `--test-settings-number` selector into the
//! caller-supplied JSON setting.

use serde_json::{Map, Value};
use thiserror::Error;

/// Canonical key for the stored-settings selector
const SETTINGS_NUMBER_KEY: &str = "test_settings_number";

/// Legacy alias some client versions sent instead of the canonical key
const CONDITION_NUMBER_KEY: &str = "test_condition_number";

/// Key holding the per-variant settings list
const TEST_SETTINGS_KEY: &str = "test_settings";

/// Top-level key that is not a settings variant and must not be wrapped
const CONCURRENCY_KEY: &str = "concurrency";

/// Setting resolution errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("--test_settings_number and --setting have different number")]
    SelectorMismatch,
}

/// A fully resolved batch run request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// Final request payload, ready to POST
    pub payload: String,
    /// True when the request targets the cross batch run endpoint
    pub is_group: bool,
}

/// Resolve the final request payload and run-targeting mode.
///
/// `settings_number` of 0 means "unset". An empty `setting` string is
/// synthesized into a selector-only payload. A setting string that is not a
/// JSON object is forwarded unmodified as a single-run request; the resolver
/// only loses the ability to introspect it, it never fails on malformed
/// input. A selector embedded in the setting must match the caller's
/// selector or be absent.
pub fn resolve(settings_number: u64, setting: &str) -> Result<ResolvedSettings, SettingsError> {
    let mut is_group = settings_number != 0;

    if setting.is_empty() {
        let payload = format!("{{\"{SETTINGS_NUMBER_KEY}\":{settings_number}}}");
        return Ok(ResolvedSettings { payload, is_group });
    }

    let mut payload = setting.to_string();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(setting) {
        let has_test_settings = map.contains_key(TEST_SETTINGS_KEY);
        let embedded = embedded_selector(&map);

        if settings_number != 0 {
            match embedded {
                Some(Some(n)) if n != settings_number => {
                    return Err(SettingsError::SelectorMismatch)
                }
                // A selector that is not even a number cannot match.
                Some(None) => return Err(SettingsError::SelectorMismatch),
                _ => {}
            }
            payload = merge_settings_number(map, has_test_settings, settings_number);
        }
        is_group = is_group || has_test_settings || embedded.is_some();
    }

    Ok(ResolvedSettings { payload, is_group })
}

/// Selector embedded in the setting object, if any.
///
/// Outer `Option` is presence of the key (canonical or legacy alias), inner
/// `Option` is whether its value is a usable number.
fn embedded_selector(map: &Map<String, Value>) -> Option<Option<u64>> {
    map.get(SETTINGS_NUMBER_KEY)
        .or_else(|| map.get(CONDITION_NUMBER_KEY))
        .map(Value::as_u64)
}

/// Inject the selector into the setting object.
///
/// When the object has no `test_settings` list yet, the remaining misc keys
/// are wrapped into a one-element list so the selector can address them as
/// an overridable variant, e.g. `{"model":"Nexus 5X"}` becomes
/// `{"test_settings":[{"model":"Nexus 5X"}]}`.
fn merge_settings_number(
    mut map: Map<String, Value>,
    has_test_settings: bool,
    settings_number: u64,
) -> String {
    map.remove(CONDITION_NUMBER_KEY);
    map.insert(SETTINGS_NUMBER_KEY.to_string(), settings_number.into());

    if !has_test_settings {
        let misc_keys: Vec<String> = map
            .keys()
            .filter(|k| k.as_str() != SETTINGS_NUMBER_KEY && k.as_str() != CONCURRENCY_KEY)
            .cloned()
            .collect();
        let mut misc = Map::new();
        for key in misc_keys {
            if let Some(value) = map.remove(&key) {
                misc.insert(key, value);
            }
        }
        if !misc.is_empty() {
            map.insert(
                TEST_SETTINGS_KEY.to_string(),
                Value::Array(vec![Value::Object(misc)]),
            );
        }
    }

    Value::Object(map).to_string()
}
