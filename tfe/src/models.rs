//! Typed reads and writes over framework values

use chrono::{DateTime, SecondsFormat, Utc};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

/// A known string; null, unknown and missing all read as `None`
pub fn optional_string(value: &DynamicValue, name: &str) -> Option<String> {
    value.get_string(&AttributePath::new(name)).ok()
}

/// Like `optional_string` but empty strings read as `None`
pub fn non_empty_string(value: &DynamicValue, name: &str) -> Option<String> {
    optional_string(value, name).filter(|s| !s.is_empty())
}

pub fn optional_bool(value: &DynamicValue, name: &str) -> Option<bool> {
    value.get_bool(&AttributePath::new(name)).ok()
}

pub fn optional_i64(value: &DynamicValue, name: &str) -> Option<i64> {
    value
        .get_number(&AttributePath::new(name))
        .ok()
        .map(|n| n as i64)
}

/// Known string elements of a list or set; `None` when the attribute is not a list
pub fn string_set(value: &DynamicValue, name: &str) -> Option<Vec<String>> {
    value.get_list(&AttributePath::new(name)).ok().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}

/// Nested object attribute as its own value
pub fn object(value: &DynamicValue, name: &str) -> Option<DynamicValue> {
    value
        .get_map(&AttributePath::new(name))
        .ok()
        .map(|m| DynamicValue::new(Dynamic::Map(m)))
}

pub fn is_known(value: &DynamicValue, name: &str) -> bool {
    value
        .get_value(&AttributePath::new(name))
        .is_some_and(Dynamic::is_known)
}

pub fn is_unknown(value: &DynamicValue, name: &str) -> bool {
    value
        .get_value(&AttributePath::new(name))
        .is_some_and(Dynamic::is_unknown)
}

pub fn set(state: &mut DynamicValue, name: &str, value: impl Into<Dynamic>) {
    let _ = state.set_value(&AttributePath::new(name), value.into());
}

pub fn set_strings<I, S>(state: &mut DynamicValue, name: &str, items: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
    items.sort();
    let _ = state.set_value(&AttributePath::new(name), Dynamic::string_list(items));
}

/// RFC 3339 with second precision, or null
pub fn timestamp(value: Option<DateTime<Utc>>) -> Dynamic {
    value
        .map(|t| Dynamic::String(t.to_rfc3339_opts(SecondsFormat::Secs, true)))
        .unwrap_or(Dynamic::Null)
}

/// Optional string from the API, which answers `""` for unset. An empty
/// answer is written as null unless `state` already holds `""`.
pub fn set_remote_string(state: &mut DynamicValue, name: &str, remote: Option<String>) {
    let keep_empty = optional_string(state, name).is_some_and(|s| s.is_empty());
    set(state, name, remote.filter(|s| keep_empty || !s.is_empty()));
}

/// Elements in `desired` missing from `current`, and the reverse
pub fn set_difference(current: &[String], desired: &[String]) -> (Vec<String>, Vec<String>) {
    let added = desired
        .iter()
        .filter(|id| !current.contains(id))
        .cloned()
        .collect();
    let removed = current
        .iter()
        .filter(|id| !desired.contains(id))
        .cloned()
        .collect();
    (added, removed)
}

/// Members in place after a sync that may have partly failed: `desired`
/// without the failed additions, plus the failed removals
pub fn members_after_sync(
    desired: &[String],
    added: &[String],
    removed: &[String],
    add_ok: bool,
    remove_ok: bool,
) -> Vec<String> {
    desired
        .iter()
        .filter(|id| add_ok || !added.contains(id))
        .chain(removed.iter().filter(|_| !remove_ok))
        .cloned()
        .collect()
}
