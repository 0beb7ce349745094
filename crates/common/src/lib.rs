//! Shared types for the marketplace backend.

mod types;

pub use types::DocumentId;
