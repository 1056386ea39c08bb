//! Incident lifecycle: create with enrichment, read, list, update, delete.

pub mod processor;

pub use processor::{total_pages, IncidentPage, IncidentProcessor};
