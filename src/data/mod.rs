//! Data module - CSV loading, specimen geometry, derived curves

mod curve;
mod geometry;
mod loader;

pub use curve::{CurveError, DerivedCurve, RawSample};
pub use geometry::{GeometryError, SpecimenGeometry};
pub use loader::{load_sample, LoaderError, EXPECTED_COLUMNS, EXPECTED_UNITS};
