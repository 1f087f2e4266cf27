//! Fuzz target for `{id:…}` tag extraction.
//!
//! Arbitrary names and descriptions must never panic, and a tag formatted
//! from any extracted key must extract to the same key again.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_tag_extraction -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;

use assetsync_client::RemoteItem;
use assetsync_reconcile::{extract_key, format_tag, locate_key_source, KeySource};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let (name, description) = text.split_once('\n').unwrap_or((text.as_ref(), ""));

    let item = RemoteItem::new("1")
        .with_name(name)
        .with_description(description);

    let key = extract_key(&item);
    let source = locate_key_source(&item);
    assert_eq!(key.is_some(), source != KeySource::Absent);

    if let Some(key) = key {
        assert!(!key.as_str().is_empty());
        assert!(!key.as_str().contains('}'));

        let normalized = RemoteItem::new("1").with_description(format_tag(&key));
        assert_eq!(extract_key(&normalized), Some(key));
        assert_eq!(locate_key_source(&normalized), KeySource::Description);
    }
});
