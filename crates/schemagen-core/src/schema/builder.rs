//! Per-file schema construction.
//!
//! The first pass extracts every struct into a record and collects
//! `(container, contained)` edges; the second pass folds those edges into each
//! record's parent list. Parents cannot be assigned inline because a struct
//! may be referenced before it is declared.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::errors::SchemaError;
use crate::models::{FileSchema, Record, SourceFile, TypeDeclKind};
use crate::schema::classify::LocalRecords;
use crate::schema::extract::extract;

/// A containment edge: `container` holds `contained`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub container: String,
    pub contained: String,
}

pub fn build(source: &SourceFile) -> Result<FileSchema, SchemaError> {
    reject_duplicates(source)?;

    let locals = LocalRecords::from_declarations(&source.declarations);
    let (mut records, edges) = extract_records(source, &locals);
    assign_parents(&mut records, &edges);

    Ok(FileSchema {
        package: source.package.clone(),
        records,
    })
}

fn reject_duplicates(source: &SourceFile) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for decl in source.declarations.iter().filter(|d| d.is_struct()) {
        if !seen.insert(decl.name.as_str()) {
            return Err(SchemaError::DuplicateRecord {
                name: decl.name.clone(),
            });
        }
    }
    Ok(())
}

/// First pass: records in declaration order plus every containment edge.
pub fn extract_records(source: &SourceFile, locals: &LocalRecords) -> (Vec<Record>, Vec<Edge>) {
    let mut records = Vec::new();
    let mut edges = Vec::new();

    for decl in &source.declarations {
        let TypeDeclKind::Struct(members) = &decl.kind else {
            continue;
        };
        let mut record = extract(&decl.name, members, locals);
        record.body_offset = decl.body_offset;
        edges.extend(record.relations.iter().map(|relation| Edge {
            container: record.name.clone(),
            contained: relation.record.clone(),
        }));
        records.push(record);
    }

    (records, edges)
}

/// Second pass: group edges by contained record, keeping discovery order and
/// collapsing repeated containers.
pub fn assign_parents(records: &mut [Record], edges: &[Edge]) {
    let mut parents: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for edge in edges {
        parents
            .entry(edge.contained.as_str())
            .or_default()
            .insert(edge.container.as_str());
    }

    for record in records.iter_mut() {
        record.parents = parents
            .get(record.name.as_str())
            .map(|set| set.iter().map(|p| p.to_string()).collect())
            .unwrap_or_default();
    }
}
