//! fishline - Tensile Test CSV Analysis & Material Property Extraction
//!
//! Core pipeline: load a force/stroke test CSV, derive the stress-strain
//! curve from the specimen geometry encoded in the file path, extract
//! material properties (modulus, yield, max force, kinetic energy, break
//! velocity), and aggregate results across groups and specimen lengths.

pub mod analysis;
pub mod charts;
pub mod config;
pub mod data;
pub mod stats;
