//! Record extraction from a single struct declaration.

use crate::models::{Field, Member, Record, Relation, TypeExpr};
use crate::schema::classify::{classify, render, LocalRecords};

/// Build the record for one struct declaration. Parents are left empty; they
/// can only be known once the whole file has been extracted.
pub fn extract(name: &str, members: &[Member], locals: &LocalRecords) -> Record {
    let mut record = Record::new(name);

    for member in members {
        match member {
            Member::Embedded(ty) => extract_embedded(&mut record, ty, locals),
            Member::Named { name, ty } => {
                let classified = classify(ty, locals);
                if !classified.complicated.is_none() {
                    record
                        .complicated
                        .insert(name.clone(), classified.complicated);
                }
                if let Some(target) = classified.relation {
                    record.relations.push(Relation {
                        field: name.clone(),
                        record: target,
                        signature: classified.signature.clone(),
                    });
                }
                record.fields.push(Field::new(name.clone(), classified.signature));
            }
        }
    }

    record
}

/// Embedded members are named after their type. `Base`, `*Base` and
/// `pkg.Base` all produce a field called `Base`. Other shapes, such as the
/// generic `Base[T]`, keep the base name with an empty signature.
fn extract_embedded(record: &mut Record, ty: &TypeExpr, locals: &LocalRecords) {
    let (field_name, field_type) = match ty {
        TypeExpr::Name(name) => (name.clone(), name.clone()),
        TypeExpr::Pointer(inner) => match inner.as_ref() {
            TypeExpr::Name(name) => (name.clone(), name.clone()),
            TypeExpr::Qualified { name, .. } => (name.clone(), render(ty)),
            _ => (base_name(ty), String::new()),
        },
        TypeExpr::Qualified { name, .. } => (name.clone(), render(ty)),
        _ => (base_name(ty), String::new()),
    };

    if locals.contains(&field_name) && field_type == field_name {
        record.relations.push(Relation {
            field: String::new(),
            record: field_name.clone(),
            signature: render(ty),
        });
    }
    record.fields.push(Field::new(field_name, field_type));
}

/// `*pkg.Base[K, V]` → `Base`.
fn base_name(ty: &TypeExpr) -> String {
    let text = render(ty);
    let head = text.trim_start_matches('*');
    let head = head.split('[').next().unwrap_or(head);
    let name = head.rsplit('.').next().unwrap_or(head).trim();
    if name.is_empty() {
        text
    } else {
        name.to_string()
    }
}
