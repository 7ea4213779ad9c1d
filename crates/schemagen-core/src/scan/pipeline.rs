//! Batch orchestration with Rayon-based parallelism.
//!
//! Every file goes through parse → build → derive → patch on its own. A
//! failing file is recorded and the rest of the batch carries on; results are
//! merged in discovery order so the collection does not depend on scheduling.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::errors::{
    BatchFailure, FailureSummary, FileFailure, SchemaGenError, SchemaGenResult,
};
use crate::models::{Collection, FileSchema, Record, SourceFile};
use crate::patch::patch_file;
use crate::scan::filesystem::discover_source_files;
use crate::scan::parser::parse_source;
use crate::schema::{build, derive_all, Derived};

/// Result of analysing one file successfully.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub schema: FileSchema,
    pub derived: Vec<Derived>,
    /// The file was rewritten on disk.
    pub written: bool,
}

/// Build and derive the schema of one parsed file without touching disk.
pub fn analyse(path: &Path, source: &SourceFile) -> SchemaGenResult<(FileSchema, Vec<Derived>)> {
    let mut schema = build(source).map_err(|e| SchemaGenError::Schema {
        path: path.to_path_buf(),
        source: e,
    })?;
    let derived = derive_all(&mut schema.records);
    Ok((schema, derived))
}

fn process_file(path: &Path, dry_run: bool) -> SchemaGenResult<FileOutcome> {
    // Offsets recorded by the parser refer to this exact text.
    let text = std::fs::read_to_string(path)?;
    let source = parse_source(path, &text)?;
    let (schema, derived) = analyse(path, &source)?;
    let written = if dry_run {
        false
    } else {
        patch_file(path, &text, &derived)?
    };
    debug!(
        "{}: {} record(s), {} changed",
        path.display(),
        schema.records.len(),
        derived.len()
    );
    Ok(FileOutcome {
        path: path.to_path_buf(),
        schema,
        derived,
        written,
    })
}

/// Process every file, in parallel when more than one worker is requested.
/// Output order always matches `files`.
pub fn parallel_process(
    files: &[PathBuf],
    workers: usize,
    dry_run: bool,
) -> Vec<SchemaGenResult<FileOutcome>> {
    if files.is_empty() {
        return vec![];
    }
    if workers <= 1 {
        return files.iter().map(|p| process_file(p, dry_run)).collect();
    }

    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build();

    match pool {
        Ok(pool) => pool.install(|| {
            files
                .par_iter()
                .map(|p| process_file(p, dry_run))
                .collect()
        }),
        Err(e) => {
            warn!("thread pool unavailable, processing sequentially: {e}");
            files.iter().map(|p| process_file(p, dry_run)).collect()
        }
    }
}

/// Per-file changes kept for reporting.
#[derive(Clone, Debug, Serialize)]
pub struct FileChange {
    pub path: String,
    pub derived: Vec<Derived>,
    pub written: bool,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub collection: Collection,
    pub files_seen: usize,
    pub changes: Vec<FileChange>,
    pub failures: BatchFailure,
    pub elapsed_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub package: Option<&'a str>,
    pub files_seen: usize,
    pub records: &'a [Record],
    pub changes: &'a [FileChange],
    pub failures: Vec<FailureSummary>,
}

impl RunReport {
    pub fn files_written(&self) -> usize {
        self.changes.iter().filter(|c| c.written).count()
    }

    pub fn summary(&self) -> RunSummary<'_> {
        RunSummary {
            package: self.collection.package.as_deref(),
            files_seen: self.files_seen,
            records: &self.collection.records,
            changes: &self.changes,
            failures: self.failures.summaries(),
        }
    }

    /// The collection, or every per-file failure as one error.
    pub fn into_result(self) -> SchemaGenResult<Collection> {
        if self.failures.is_empty() {
            Ok(self.collection)
        } else {
            Err(SchemaGenError::Batch(self.failures))
        }
    }
}

/// Run over an explicit file list.
pub fn run_files(files: &[PathBuf], config: &RunConfig) -> RunReport {
    let started = Instant::now();
    let mut report = RunReport {
        files_seen: files.len(),
        ..RunReport::default()
    };

    let results = parallel_process(files, config.workers, config.dry_run);
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(outcome) => {
                if !outcome.derived.is_empty() {
                    report.changes.push(FileChange {
                        path: outcome.path.to_string_lossy().replace('\\', "/"),
                        derived: outcome.derived,
                        written: outcome.written,
                    });
                }
                report.collection.absorb(outcome.schema);
            }
            Err(error) => {
                warn!("{}: {error}", path.display());
                report.failures.failures.push(FileFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    report.elapsed_ms = started.elapsed().as_millis();
    info!(
        files_seen = report.files_seen,
        records = report.collection.len(),
        files_written = report.files_written(),
        failures = report.failures.len(),
        elapsed_ms = report.elapsed_ms as u64,
        dry_run = config.dry_run,
        "schema run finished"
    );
    report
}

/// Discover the source files of `dir` and run over them. Only discovery
/// errors abort; per-file failures end up in the report.
pub fn run(dir: &Path, config: &RunConfig) -> SchemaGenResult<RunReport> {
    let files = discover_source_files(dir, &config.discovery)?;
    info!("found {} source file(s) in {}", files.len(), dir.display());
    Ok(run_files(&files, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config(workers: usize, dry_run: bool) -> RunConfig {
        RunConfig {
            workers,
            dry_run,
            ..RunConfig::default()
        }
    }

    #[test]
    fn end_to_end_patches_parent_and_child() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "family.go",
            "\
package family

type Parent struct {
\tChild
}

type Child struct {
\tName string
}
",
        );

        let report = run(tmp.path(), &config(1, false)).unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.files_written(), 1);

        let child = report.collection.record("Child").unwrap();
        assert_eq!(child.parents, vec!["Parent"]);
        assert_eq!(
            child.fields,
            vec![
                Field::new("ID", "int"),
                Field::new("ParentID", "int"),
                Field::new("Name", "string"),
            ]
        );

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "\
package family

type Parent struct {
\tID int
\tChild
}

type Child struct {
\tID int
\tParentID int
\tName string
}
"
        );

        let again = run(tmp.path(), &config(1, false)).unwrap();
        assert!(again.changes.is_empty());
        assert_eq!(again.files_written(), 0);
    }

    #[test]
    fn anonymous_struct_fields_and_comments_survive_reruns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "config.go",
            "\
package conf

// Server mirrors: type Server struct {
type Config struct {
\tServer struct {
\t\tHost string
\t}
}

type Server struct {
\tPort int
}
",
        );

        let report = run(tmp.path(), &config(1, false)).unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.files_written(), 1);
        let patched = fs::read_to_string(&path).unwrap();
        assert_eq!(
            patched,
            "\
package conf

// Server mirrors: type Server struct {
type Config struct {
\tID int
\tServer struct {
\t\tHost string
\t}
}

type Server struct {
\tID int
\tPort int
}
"
        );

        let again = run(tmp.path(), &config(1, false)).unwrap();
        assert!(again.failures.is_empty());
        assert!(again.changes.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), patched);
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a_broken.go", "package models\n\ntype A struct {\n");
        write(
            tmp.path(),
            "b_dup.go",
            "package models\n\ntype B struct{}\n\nfunc f() {\n\ttype B struct{}\n}\n",
        );
        let good = write(tmp.path(), "c_good.go", "package models\n\ntype C struct {\n}\n");

        let report = run(tmp.path(), &config(4, false)).unwrap();
        assert_eq!(report.files_seen, 3);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            report.failures.failures[0].error,
            SchemaGenError::Parse { .. }
        ));
        assert!(matches!(
            report.failures.failures[1].error,
            SchemaGenError::Schema { .. }
        ));
        assert_eq!(
            fs::read_to_string(good).unwrap(),
            "package models\n\ntype C struct {\n\tID int\n}\n"
        );

        match report.into_result() {
            Err(SchemaGenError::Batch(batch)) => assert_eq!(batch.len(), 2),
            other => panic!("expected batch failure, got {other:?}"),
        }
    }

    #[test]
    fn dry_run_leaves_files_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let original = "package shop\n\ntype Item struct {\n\tName string\n}\n";
        let path = write(tmp.path(), "item.go", original);

        let report = run(tmp.path(), &config(2, true)).unwrap();
        assert_eq!(report.changes.len(), 1);
        assert!(!report.changes[0].written);
        assert_eq!(fs::read_to_string(path).unwrap(), original);
        assert_eq!(
            report.collection.record("Item").unwrap().fields[0],
            Field::new("ID", "int")
        );
    }

    #[test]
    fn package_from_first_file_and_records_in_discovery_order() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.go", "package first\n\ntype A struct{ ID int }\n");
        write(tmp.path(), "b.go", "package second\n\ntype B struct{ ID int }\n");

        let report = run(tmp.path(), &config(3, true)).unwrap();
        assert_eq!(report.collection.package.as_deref(), Some("first"));
        let names: Vec<&str> = report
            .collection
            .records
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B"]);

        let summary = serde_json::to_value(report.summary()).unwrap();
        assert_eq!(summary["package"], "first");
        assert_eq!(summary["records"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn relations_do_not_cross_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.go", "package m\n\ntype Holder struct{\n\tItems []Item\n}\n");
        write(tmp.path(), "b.go", "package m\n\ntype Item struct{\n\tName string\n}\n");

        let report = run(tmp.path(), &config(1, true)).unwrap();
        let holder = report.collection.record("Holder").unwrap();
        assert!(holder.relations.is_empty());
        assert!(report.collection.record("Item").unwrap().parents.is_empty());
    }
}
