//! Field-level diff: compare two settings snapshots.
//!
//! Snapshots are serialized to JSON and flattened into
//! `BTreeMap<String, serde_json::Value>` keyed by dotted field path. The diff
//! detects field additions, removals, and value modifications.

use std::collections::BTreeMap;

use folio_types::{ApplicationSettings, DocumentSettings};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DiffError, DiffResult};

/// The result of comparing two settings snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsDiff {
    /// The list of field changes, removals and modifications first.
    pub changes: Vec<FieldChange>,
}

impl SettingsDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of added fields.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, FieldChange::Added { .. }))
            .count()
    }

    /// Number of removed fields.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, FieldChange::Removed { .. }))
            .count()
    }

    /// Number of modified fields.
    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, FieldChange::Modified { .. }))
            .count()
    }

    /// Returns `true` if `field` or any field nested under it changed.
    ///
    /// `is_changed("current_page")` matches `current_page.doc_index`.
    pub fn is_changed(&self, field: &str) -> bool {
        self.changes.iter().any(|c| {
            let path = c.field();
            path == field
                || path
                    .strip_prefix(field)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// Paths of every changed field, in diff order.
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(FieldChange::field)
    }

    /// The change recorded for exactly `field`, if any.
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field() == field)
    }
}

/// A single change between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldChange {
    /// A field present only in the new snapshot.
    Added { field: String, value: Value },
    /// A field present only in the old snapshot.
    Removed { field: String, value: Value },
    /// A field whose value differs between the snapshots.
    Modified {
        field: String,
        old: Value,
        new: Value,
    },
}

impl FieldChange {
    /// Dotted path of the changed field.
    pub fn field(&self) -> &str {
        match self {
            Self::Added { field, .. } | Self::Removed { field, .. } | Self::Modified { field, .. } => {
                field
            }
        }
    }
}

/// Diff two application settings snapshots.
pub fn diff_application(
    old: &ApplicationSettings,
    new: &ApplicationSettings,
) -> DiffResult<SettingsDiff> {
    diff_settings(old, new)
}

/// Diff two snapshots of a document's settings.
pub fn diff_document(old: &DocumentSettings, new: &DocumentSettings) -> DiffResult<SettingsDiff> {
    diff_settings(old, new)
}

/// Diff any two serializable snapshots of the same kind.
pub fn diff_settings<T: Serialize + ?Sized>(old: &T, new: &T) -> DiffResult<SettingsDiff> {
    let old = to_value(old)?;
    let new = to_value(new)?;
    Ok(diff_fields(&flatten(&old)?, &flatten(&new)?))
}

/// Flatten a JSON object into leaf values keyed by dotted path.
///
/// Nested objects are descended into; arrays and scalars are leaves. An
/// empty nested object is kept as a leaf so its presence is still compared.
pub fn flatten(value: &Value) -> DiffResult<BTreeMap<String, Value>> {
    let Value::Object(map) = value else {
        return Err(DiffError::NotAnObject(kind_name(value)));
    };
    let mut out = BTreeMap::new();
    for (key, child) in map {
        flatten_into(key.clone(), child, &mut out);
    }
    Ok(out)
}

fn flatten_into(path: String, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(format!("{path}.{key}"), child, out);
            }
        }
        _ => {
            out.insert(path, value.clone());
        }
    }
}

/// Compute the diff between two flattened field maps.
///
/// Fields present only in `new` are `Added`, fields present only in `old`
/// are `Removed`, and fields present in both with different values are
/// `Modified`.
pub fn diff_fields(old: &BTreeMap<String, Value>, new: &BTreeMap<String, Value>) -> SettingsDiff {
    let mut changes = Vec::new();

    for (field, old_val) in old {
        match new.get(field) {
            Some(new_val) => {
                if old_val != new_val {
                    changes.push(FieldChange::Modified {
                        field: field.clone(),
                        old: old_val.clone(),
                        new: new_val.clone(),
                    });
                }
            }
            None => {
                changes.push(FieldChange::Removed {
                    field: field.clone(),
                    value: old_val.clone(),
                });
            }
        }
    }

    for (field, new_val) in new {
        if !old.contains_key(field) {
            changes.push(FieldChange::Added {
                field: field.clone(),
                value: new_val.clone(),
            });
        }
    }

    SettingsDiff { changes }
}

fn to_value<T: Serialize + ?Sized>(snapshot: &T) -> DiffResult<Value> {
    serde_json::to_value(snapshot).map_err(|e| DiffError::Serialization(e.to_string()))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use folio_types::{DocumentKey, PageAlign, PageIndex};
    use proptest::prelude::*;
    use serde_json::json;

    fn make_fields(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn identical_snapshots_no_diff() {
        let app = ApplicationSettings::default();
        let diff = diff_application(&app, &app).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn generation_alone_is_not_a_change() {
        let old = ApplicationSettings::default().with_generation(1);
        let new = ApplicationSettings::default().with_generation(2);
        assert!(diff_application(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn application_field_modification() {
        let old = ApplicationSettings::default();
        let mut new = old.clone();
        new.night_mode = true;
        new.document_defaults.page_align = PageAlign::Auto;

        let diff = diff_application(&old, &new).unwrap();
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.modifications(), 2);
        assert!(diff.is_changed("night_mode"));
        assert!(diff.is_changed("document_defaults"));
        assert!(diff.is_changed("document_defaults.page_align"));
        assert!(!diff.is_changed("document_defaults.split_pages"));
        assert!(!diff.is_changed("full_screen"));
    }

    #[test]
    fn document_page_change_reports_nested_fields() {
        let app = Arc::new(ApplicationSettings::default());
        let old = DocumentSettings::new(DocumentKey::new("a.pdf").unwrap(), app);
        let new = old.with_current_page(PageIndex::new(2, 2));

        let diff = diff_document(&old, &new).unwrap();
        assert!(diff.is_changed("current_page"));
        assert!(diff.get("current_page.doc_index").is_some());
        assert!(diff.is_changed("last_updated"));
        assert!(!diff.is_changed("zoom"));
        assert!(!diff.is_changed("layout"));
    }

    #[test]
    fn prefix_match_requires_path_boundary() {
        let old = make_fields(&[("zoom", json!(1.0)), ("zoomed", json!(false))]);
        let new = make_fields(&[("zoom", json!(1.0)), ("zoomed", json!(true))]);
        let diff = diff_fields(&old, &new);
        assert!(diff.is_changed("zoomed"));
        assert!(!diff.is_changed("zoom"));
    }

    #[test]
    fn flatten_nested_objects() {
        let value = json!({"a": 1, "b": {"c": true, "d": {"e": "x"}}, "empty": {}});
        let flat = flatten(&value).unwrap();
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b.c", "b.d.e", "empty"]);
    }

    #[test]
    fn flatten_rejects_non_objects() {
        assert!(matches!(
            flatten(&json!([1, 2])),
            Err(DiffError::NotAnObject("array"))
        ));
        assert!(matches!(
            diff_settings(&1u32, &2u32),
            Err(DiffError::NotAnObject("number"))
        ));
    }

    #[test]
    fn mixed_changes() {
        let old = make_fields(&[
            ("keep", json!(true)),
            ("modify", json!("old")),
            ("remove", json!(42)),
        ]);
        let new = make_fields(&[
            ("keep", json!(true)),
            ("modify", json!("new")),
            ("added", json!([1, 2, 3])),
        ]);

        let diff = diff_fields(&old, &new);
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.removals(), 1);
        assert_eq!(diff.modifications(), 1);

        let fields: Vec<&str> = diff.changed_fields().collect();
        assert_eq!(fields, vec!["modify", "remove", "added"]);
    }

    #[test]
    fn modification_records_both_values() {
        let old = make_fields(&[("brightness", json!(40))]);
        let new = make_fields(&[("brightness", json!(80))]);

        match diff_fields(&old, &new).get("brightness") {
            Some(FieldChange::Modified { old, new, .. }) => {
                assert_eq!(*old, json!(40));
                assert_eq!(*new, json!(80));
            }
            other => panic!("expected Modified, got {:?}", other),
        }
    }

    fn field_map() -> impl Strategy<Value = BTreeMap<String, Value>> {
        proptest::collection::btree_map("[a-e]{1,2}", any::<i64>().prop_map(Value::from), 0..8)
    }

    proptest! {
        #[test]
        fn diff_with_self_is_empty(fields in field_map()) {
            prop_assert!(diff_fields(&fields, &fields).is_empty());
        }

        #[test]
        fn reversed_diff_swaps_additions_and_removals(a in field_map(), b in field_map()) {
            let forward = diff_fields(&a, &b);
            let backward = diff_fields(&b, &a);
            prop_assert_eq!(forward.additions(), backward.removals());
            prop_assert_eq!(forward.removals(), backward.additions());
            prop_assert_eq!(forward.modifications(), backward.modifications());
        }
    }
}
