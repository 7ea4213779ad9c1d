//! Identity and foreign-key derivation.

use serde::Serialize;

use crate::models::{foreign_key_name, Field, Record, IDENTITY_FIELD, KEY_TYPE};

/// Fields a record gained during derivation, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Derived {
    pub record: String,
    pub added: Vec<Field>,
    #[serde(skip)]
    pub body_offset: Option<usize>,
}

/// Fields the record lacks: identity first, then one foreign key per distinct
/// parent in parent order. Presence is checked by name only.
pub fn missing_keys(record: &Record) -> Vec<Field> {
    let mut missing = Vec::new();

    if !record.has_field_named(IDENTITY_FIELD) {
        missing.push(Field::new(IDENTITY_FIELD, KEY_TYPE));
    }

    for parent in &record.parents {
        let name = foreign_key_name(parent);
        if record.has_field_named(&name) || missing.iter().any(|f: &Field| f.name == name) {
            continue;
        }
        missing.push(Field::new(name, KEY_TYPE));
    }

    missing
}

/// Prepend the missing keys to the record's fields as one contiguous block
/// and return them. Existing fields keep their relative order.
pub fn derive_keys(record: &mut Record) -> Vec<Field> {
    let added = missing_keys(record);
    if added.is_empty() {
        return added;
    }

    let original = std::mem::take(&mut record.fields);
    record.fields = added.iter().cloned().chain(original).collect();
    added
}

/// Derive every record of a file; only records that changed are reported.
pub fn derive_all(records: &mut [Record]) -> Vec<Derived> {
    records
        .iter_mut()
        .filter_map(|record| {
            let added = derive_keys(record);
            (!added.is_empty()).then(|| Derived {
                record: record.name.clone(),
                added,
                body_offset: record.body_offset,
            })
        })
        .collect()
}
