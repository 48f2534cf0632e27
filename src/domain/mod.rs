//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`PipelineConfig`, `NegativeKwhPolicy`)
//! - validated meter readings (`RawReading`)
//! - the per-building object model (`BuildingRegistry`, `Building`, `MeterEntry`)

pub mod registry;
pub mod types;

pub use registry::*;
pub use types::*;
