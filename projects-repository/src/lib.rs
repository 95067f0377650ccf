//! # Projects Repository
//!
//! This crate provides the record store used by the project registry. The
//! store has hash-map semantics over named namespaces: get-all, get-by-key,
//! set-by-key and remove-by-key, with values held as opaque serialized
//! strings. It includes definitions for errors, the `HashStore` interface,
//! an in-memory backend for tests and development, a PostgreSQL backend, and
//! a typed `ProjectRepository` that (de)serializes `Project` records.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod projects;
pub mod source;

pub use errors::StoreError;
pub use interfaces::HashStore;
pub use memory::MockHashStore;
pub use postgres::PostgresHashStore;
pub use projects::{ProjectRepository, PROJECTS_NAMESPACE};
pub use source::StoreSource;
