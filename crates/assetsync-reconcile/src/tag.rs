//! Embedded key tags.
//!
//! A managed remote item carries its composite key as `{id:<key>}` inside its
//! description or, before normalization, inside its name. The description is
//! always searched first.

use regex::Regex;
use std::sync::LazyLock;

use assetsync_client::RemoteItem;

use crate::identity::CompositeKey;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{id:([^}]+)\}").expect("tag pattern is valid"));

/// Where an item's tag was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Description,
    /// Tag only in the name: the item still needs normalizing.
    Name,
    Absent,
}

/// Recover the composite key embedded in `item`, if any.
#[must_use]
pub fn extract_key(item: &RemoteItem) -> Option<CompositeKey> {
    extract_with_source(item).map(|(key, _)| key)
}

#[must_use]
pub fn locate_key_source(item: &RemoteItem) -> KeySource {
    extract_with_source(item).map_or(KeySource::Absent, |(_, source)| source)
}

/// Key and the field it came from, description first.
pub(crate) fn extract_with_source(item: &RemoteItem) -> Option<(CompositeKey, KeySource)> {
    if let Some(payload) = find_payload(item.description.as_deref()) {
        return Some((CompositeKey::new(payload), KeySource::Description));
    }
    find_payload(item.name.as_deref()).map(|payload| (CompositeKey::new(payload), KeySource::Name))
}

fn find_payload(text: Option<&str>) -> Option<&str> {
    TAG_PATTERN
        .captures(text?)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `{id:<key>}`
#[must_use]
pub fn format_tag(key: &CompositeKey) -> String {
    format!("{{id:{key}}}")
}

/// `text` with every tag removed, trimmed.
#[must_use]
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").trim().to_string()
}
