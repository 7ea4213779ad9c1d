//! Schema inference: classification, extraction, parent indexing and key
//! derivation. Everything here is a pure transform over parsed declarations.

pub mod builder;
pub mod classify;
pub mod extract;
pub mod keys;

pub use builder::build;
pub use keys::{derive_all, derive_keys, Derived};
