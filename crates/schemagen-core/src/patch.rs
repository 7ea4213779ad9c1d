//! Textual patching of struct declarations.
//!
//! Derived fields are inserted as new lines right after the opening brace of
//! each struct body, at the byte offset the parser recorded for it. Nothing
//! else in the file is touched.

use std::path::Path;

use tracing::debug;

use crate::errors::{PatchError, SchemaGenError, SchemaGenResult};
use crate::models::Field;
use crate::schema::Derived;

fn insertion_text(fields: &[Field], followed_by_newline: bool) -> String {
    let mut out = String::new();
    for field in fields {
        out.push_str("\n\t");
        out.push_str(&field.declaration());
    }
    if !followed_by_newline {
        out.push('\n');
    }
    out
}

/// Offset of the record's body in `source`, checked against the brace the
/// parser saw there.
fn body_offset(source: &str, entry: &Derived) -> Result<usize, PatchError> {
    entry
        .body_offset
        .filter(|&at| at > 0 && at <= source.len() && source.as_bytes()[at - 1] == b'{')
        .ok_or_else(|| PatchError::DeclarationNotFound {
            record: entry.record.clone(),
        })
}

/// Insert every derived field into `source`, which must be the text the
/// entries were derived from. Fails without partial output if any body
/// offset is missing or does not land after a `{`.
pub fn patch_source(source: &str, derived: &[Derived]) -> Result<String, PatchError> {
    let mut edits = Vec::new();
    for entry in derived.iter().filter(|d| !d.added.is_empty()) {
        edits.push((body_offset(source, entry)?, entry));
    }
    // Highest offset first so earlier offsets stay valid.
    edits.sort_by(|a, b| b.0.cmp(&a.0));

    let mut patched = source.to_string();
    for (at, entry) in edits {
        let rest = &source[at..];
        let followed_by_newline = rest.starts_with('\n') || rest.starts_with("\r\n");
        patched.insert_str(at, &insertion_text(&entry.added, followed_by_newline));
    }

    Ok(patched)
}

/// Write the patched form of `source` back to `path`. Returns whether the
/// file was rewritten.
pub fn patch_file(path: &Path, source: &str, derived: &[Derived]) -> SchemaGenResult<bool> {
    if derived.iter().all(|d| d.added.is_empty()) {
        return Ok(false);
    }

    let patched = patch_source(source, derived).map_err(|err| SchemaGenError::Patch {
        path: path.to_path_buf(),
        source: err,
    })?;

    if patched == source {
        return Ok(false);
    }
    std::fs::write(path, patched)?;
    debug!("patched {} ({} record(s))", path.display(), derived.len());
    Ok(true)
}
