//! Sample Curve Module
//! In-memory record of one tensile test and its derived stress-strain curve.

use crate::data::geometry::SpecimenGeometry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurveError {
    #[error("Degenerate geometry: cross-section area {area_mm2} mm², gauge length {gauge_length_mm} mm")]
    DegenerateGeometry { area_mm2: f64, gauge_length_mm: f64 },
}

/// Raw columns parsed from one test CSV. Time is monotonically
/// non-decreasing (validated on load); columns are index-aligned.
#[derive(Debug, Clone, Default)]
pub struct RawSample {
    pub time_s: Vec<f64>,
    pub force_n: Vec<f64>,
    pub stroke_mm: Vec<f64>,
}

impl RawSample {
    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }
}

/// Stress-strain series derived from a raw sample and its geometry.
/// Same length and index alignment as the raw columns; derived once.
#[derive(Debug, Clone)]
pub struct DerivedCurve {
    /// Stress in MPa (N/mm²): force / cross-sectional area.
    pub stress_mpa: Vec<f64>,
    /// Dimensionless strain: stroke / gauge length.
    pub strain: Vec<f64>,
}

impl DerivedCurve {
    /// Convert force/stroke to stress/strain. Fails instead of dividing by a
    /// zero area or gauge length.
    pub fn derive(raw: &RawSample, geometry: &SpecimenGeometry) -> Result<Self, CurveError> {
        let area_mm2 = geometry.cross_section_area_mm2();
        let gauge_length_mm = geometry.gauge_length_mm;
        if area_mm2 <= 0.0 || gauge_length_mm <= 0.0 {
            return Err(CurveError::DegenerateGeometry {
                area_mm2,
                gauge_length_mm,
            });
        }

        Ok(Self {
            stress_mpa: raw.force_n.iter().map(|f| f / area_mm2).collect(),
            strain: raw.stroke_mm.iter().map(|s| s / gauge_length_mm).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.strain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strain.is_empty()
    }
}
