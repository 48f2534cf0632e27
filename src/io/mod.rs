//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - cleaned data, summary, and report exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
