//! Interface definitions for the record store.
//!
//! This module defines the abstract `HashStore` trait so the registry can be
//! run against swappable backends.

mod hash_store;

pub use hash_store::HashStore;
