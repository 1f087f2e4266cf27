//! Fuzz target for composite key derivation.
//!
//! Splits the input into key field values and checks that derivation is
//! total, deterministic and insensitive to surrounding whitespace.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_composite_key -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;

use assetsync_reconcile::{derive_key, LocalRecord};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let values: Vec<&str> = text.split('\u{1f}').take(8).collect();

    let fields: Vec<String> = (0..values.len()).map(|i| format!("f{i}")).collect();
    let record: LocalRecord = fields
        .iter()
        .zip(&values)
        .map(|(field, value)| (field.clone(), Some((*value).to_string())))
        .collect();
    let padded: LocalRecord = fields
        .iter()
        .zip(&values)
        .map(|(field, value)| (field.clone(), Some(format!("  {value}\t"))))
        .collect();

    let key = derive_key(&record, &fields);

    assert_eq!(key.as_str().len(), 64);
    assert!(key
        .as_str()
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    assert_eq!(key, derive_key(&record, &fields));
    assert_eq!(key, derive_key(&padded, &fields));
});
