//! schemagen core library.
//!
//! Scans Go struct declarations, builds a relational model of them (records,
//! containment relations, parent links) and derives the identity and
//! foreign-key fields each struct is missing. The derived fields are then
//! written back into the source declarations.
//!
//! The [`schema`] passes are pure; [`scan`] and [`patch`] hold everything that
//! touches the filesystem.

pub mod config;
pub mod errors;
pub mod models;
pub mod patch;
pub mod scan;
pub mod schema;

pub use config::RunConfig;
pub use errors::{SchemaGenError, SchemaGenResult};
pub use models::{Collection, Complicated, Field, Record, Relation};
pub use scan::pipeline::{run, run_files, RunReport};
