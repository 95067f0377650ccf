//! Error types for the projects repository.

mod store_error;

pub use store_error::StoreError;
