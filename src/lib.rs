//! Waste incident reporting service.
//!
//! Citizens report waste incidents; each report is classified into a waste
//! category, tagged with keywords, embedded for similarity lookup and linked
//! to near-duplicate reports. Analytics over the stored reports feed an
//! admin dashboard.

pub mod analytics;
pub mod api;
pub mod audit;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod processing;
pub mod state;
pub mod telemetry;

pub use error::{AppError, Result};
