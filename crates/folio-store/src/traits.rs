use std::collections::BTreeMap;

use folio_types::{DocumentKey, DocumentSettings};

use crate::error::StoreResult;

/// Durable store for per-document settings.
///
/// All implementations must satisfy these invariants:
/// - At most one record exists per [`DocumentKey`]; storing a record
///   replaces any previous one for the same key.
/// - Each call is atomic on its own. Nothing spans calls.
/// - Returned records are not bound to any application settings.
/// - All I/O errors are propagated, never silently ignored.
pub trait SettingsStore: Send + Sync {
    /// Read the record for `key`.
    ///
    /// Returns `Ok(None)` if no record exists.
    fn get_document(&self, key: &DocumentKey) -> StoreResult<Option<DocumentSettings>>;

    /// Read stored records.
    ///
    /// With `include_all` every record is returned. Without it only the most
    /// recently updated record is returned (an empty map if the store is
    /// empty).
    fn all_documents(&self, include_all: bool) -> StoreResult<BTreeMap<DocumentKey, DocumentSettings>>;

    /// Insert or replace the record for `doc.key`.
    fn store_document(&self, doc: &DocumentSettings) -> StoreResult<()>;

    /// Erase every stored record.
    fn delete_all(&self) -> StoreResult<()>;

    /// Check whether a record exists for `key`.
    fn contains(&self, key: &DocumentKey) -> StoreResult<bool> {
        Ok(self.get_document(key)?.is_some())
    }
}

/// Apply the `include_all` selection rule to a full set of records.
pub(crate) fn select_documents<'a, I>(records: I, include_all: bool) -> BTreeMap<DocumentKey, DocumentSettings>
where
    I: IntoIterator<Item = &'a DocumentSettings>,
{
    let records = records.into_iter();
    if include_all {
        return records.map(|doc| (doc.key.clone(), doc.clone())).collect();
    }
    // Ties on last_updated resolve to the greatest key so the choice is stable.
    records
        .max_by(|a, b| {
            a.last_updated
                .cmp(&b.last_updated)
                .then_with(|| a.key.cmp(&b.key))
        })
        .map(|doc| (doc.key.clone(), doc.clone()))
        .into_iter()
        .collect()
}
