//! Match/diff core.
//!
//! Pure: no I/O, no logging. Everything observable about a reconciliation is
//! in the returned [`ActionSet`].

use std::collections::{HashMap, HashSet};

use assetsync_client::{AttributeRewrite, ItemValue, RemoteItem};

use crate::actions::{ActionSet, CreationCandidate, RetirementAction, UpdateAction};
use crate::identity::{derive_key, CompositeKey};
use crate::local::LocalRecord;
use crate::provider::ProviderConfig;
use crate::tag::{extract_with_source, format_tag, strip_tags, KeySource};

/// Compute the actions that bring `remote_items` in line with `local_records`.
///
/// - A local record whose key is found remotely becomes an update. The first
///   remote item carrying a key wins; later ones with the same key are left
///   alone.
/// - A local record without a match becomes a creation candidate.
/// - A tagged remote item whose key no local record derives is retired.
///   Untagged items are ignored.
#[must_use]
pub fn reconcile(
    local_records: &[LocalRecord],
    remote_items: &[RemoteItem],
    config: &ProviderConfig,
) -> ActionSet {
    let mut actions = ActionSet::default();
    actions.stats.local_records = local_records.len();
    actions.stats.remote_items = remote_items.len();

    let mut index: HashMap<CompositeKey, (&RemoteItem, KeySource)> = HashMap::new();
    for item in remote_items {
        match extract_with_source(item) {
            None => actions.stats.unmanaged_items += 1,
            Some((key, source)) => {
                if index.contains_key(&key) {
                    actions.stats.duplicate_remote_keys += 1;
                } else {
                    index.insert(key, (item, source));
                }
            }
        }
    }

    let mut local_keys: HashSet<CompositeKey> = HashSet::with_capacity(local_records.len());
    for record in local_records {
        let key = derive_key(record, &config.composite_key_columns);
        match index.get(&key) {
            Some((item, source)) => {
                actions.stats.matched += 1;
                actions
                    .updates
                    .push(plan_update(record, item, *source, key.clone(), config));
            }
            None => {
                actions.stats.creation_candidates += 1;
                actions.creations.push(CreationCandidate {
                    key: key.clone(),
                    record: record.clone(),
                });
            }
        }
        local_keys.insert(key);
    }

    for item in remote_items {
        let Some((key, _)) = extract_with_source(item) else {
            continue;
        };
        if !local_keys.contains(&key) {
            actions.stats.retirements += 1;
            actions.retirements.push(RetirementAction {
                item_id: item.id.clone(),
                key,
                value: ItemValue::zero_like(item.value.as_ref()),
            });
        }
    }

    actions
}

fn plan_update(
    record: &LocalRecord,
    item: &RemoteItem,
    source: KeySource,
    key: CompositeKey,
    config: &ProviderConfig,
) -> UpdateAction {
    let value = record.non_blank(&config.value_column).map(|value| {
        match config.currency_column.as_deref() {
            Some(currency_column) => {
                ItemValue::amount_from_text(value, record.non_blank(currency_column))
            }
            None => ItemValue::from_text(value),
        }
    });

    let rewrite = (source == KeySource::Name).then(|| normalized_attributes(record, item, &key, config));

    UpdateAction {
        item_id: item.id.clone(),
        key,
        value,
        rewrite,
    }
}

/// Attributes moving the tag from the name into the description.
fn normalized_attributes(
    record: &LocalRecord,
    item: &RemoteItem,
    key: &CompositeKey,
    config: &ProviderConfig,
) -> AttributeRewrite {
    let tag = format_tag(key);

    let description = match item.description.as_deref().map(str::trim) {
        Some(existing) if config.preserve_description && !existing.is_empty() => {
            format!("{tag} {existing}")
        }
        _ => tag,
    };

    let name = config
        .csv_asset_description_column
        .as_deref()
        .and_then(|column| record.non_blank(column))
        .map_or_else(
            || strip_tags(item.name.as_deref().unwrap_or_default()),
            str::to_string,
        );

    AttributeRewrite { description, name }
}
