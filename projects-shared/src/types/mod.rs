//! Core data structures for the project registry.

pub mod capability;
pub mod ids;
pub mod links;
pub mod project;
pub mod realm;
