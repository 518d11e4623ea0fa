//! Partial merge of freshly fetched tab data into a tab's existing data.

use serde_json::{Map, Value};
use session_contract::TabData;

use crate::config::DeepFieldSet;

/// Merges `patch` into `base`.
///
/// Top-level buckets present in `patch` replace those in `base`; buckets only in `base` survive.
/// Unless `shallow` is set, every bucket named in `deep_fields` is then rebuilt as the union of
/// both sides' keys with `patch` winning, so updating `web.loading` keeps `web.title`.
///
/// A deep bucket is always present as an object after a non-shallow merge, even when neither
/// side carried it. Non-object values in a deep bucket count as empty.
pub fn merge_tab_data(
    base: &TabData,
    patch: &TabData,
    shallow: bool,
    deep_fields: &DeepFieldSet,
) -> TabData {
    let mut merged = base.as_map().clone();
    for (bucket, value) in patch.iter() {
        merged.insert(bucket.clone(), value.clone());
    }

    if shallow {
        return merged.into();
    }

    for field in deep_fields.iter() {
        let mut bucket = object_entries(base.get(field));
        bucket.extend(object_entries(patch.get(field)));
        merged.insert(field.to_string(), Value::Object(bucket));
    }
    merged.into()
}

fn object_entries(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(entries)) => entries.clone(),
        _ => Map::new(),
    }
}
