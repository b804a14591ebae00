//! Property Extractor Module
//! Turns a stress-strain curve into calibrated material properties.

use crate::analysis::knee::find_knee;
use crate::config::AnalysisConfig;
use crate::data::{CurveError, DerivedCurve, RawSample, SpecimenGeometry};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Zero area, zero gauge length, or zero strain range. Such samples are
    /// rejected rather than allowed to produce NaN/Inf results.
    #[error("Degenerate sample: {0}")]
    DegenerateSample(String),
}

impl From<CurveError> for AnalysisError {
    fn from(err: CurveError) -> Self {
        AnalysisError::DegenerateSample(err.to_string())
    }
}

/// Scalar results for one analyzed sample. Immutable value type.
#[derive(Debug, Clone)]
pub struct MaterialProperties {
    /// Slope of the linear-elastic region, MPa.
    pub modulus_mpa: f64,
    /// Stress at the onset of non-linearity, MPa.
    pub yield_stress_mpa: f64,
    /// Peak of the force column, N. First occurrence wins on ties.
    pub max_force_n: f64,
    /// Strain energy up to the max-force point converted through the
    /// effective mass model, J.
    pub kinetic_energy_j: f64,
    /// Velocity from KE = ½mv², m/s.
    pub velocity_m_s: f64,
    /// (strain, stress) of the detected knee, for plot annotation.
    pub yield_point: Option<(f64, f64)>,
    /// True when knee detection did not converge and the modulus came from
    /// the fixed initial-fraction regression. Degraded confidence, not an
    /// error; callers surface it as a warning.
    pub modulus_from_fallback: bool,
    pub geometry: SpecimenGeometry,
}

/// Properties plus the stress-strain curve they were computed from. The
/// curve is derived exactly once per sample; plotting reuses this copy.
#[derive(Debug, Clone)]
pub struct SampleAnalysis {
    pub properties: MaterialProperties,
    pub curve: DerivedCurve,
}

pub struct PropertyExtractor;

impl PropertyExtractor {
    /// Extract material properties from a raw sample.
    ///
    /// The elastic-region boundary comes from Kneedle-style knee detection on
    /// the curve prefix ending at the max-force point. Without a knee the
    /// modulus regression deterministically falls back to the first
    /// `fallback_fraction` of that prefix, and yield falls back to the first
    /// point whose local slope drops below `slope_drop_ratio` of the modulus
    /// (or, for data that never departs from linearity, the stress at the
    /// max-force point).
    pub fn extract(
        raw: &RawSample,
        geometry: &SpecimenGeometry,
        config: &AnalysisConfig,
    ) -> Result<SampleAnalysis, AnalysisError> {
        let area_mm2 = geometry.cross_section_area_mm2();
        if area_mm2 <= 0.0 {
            return Err(AnalysisError::DegenerateSample(format!(
                "cross-sectional area {} mm² (diameter {} mm)",
                area_mm2, geometry.diameter_mm
            )));
        }
        if geometry.gauge_length_mm <= 0.0 {
            return Err(AnalysisError::DegenerateSample(format!(
                "gauge length {} mm",
                geometry.gauge_length_mm
            )));
        }
        if raw.len() < 2 {
            return Err(AnalysisError::DegenerateSample(format!(
                "only {} data points",
                raw.len()
            )));
        }

        let curve = DerivedCurve::derive(raw, geometry)?;

        // Max force: first occurrence of the maximum (lowest strain wins).
        let max_idx = argmax_first(&raw.force_n);
        let max_force_n = raw.force_n[max_idx];

        let strain = &curve.strain[..=max_idx];
        let stress = &curve.stress_mpa[..=max_idx];
        if max_idx == 0 || strain[max_idx] - strain[0] <= 0.0 {
            return Err(AnalysisError::DegenerateSample(
                "zero strain range up to the max-force point".to_string(),
            ));
        }

        // Elastic region boundary. A knee with fewer than 3 points before it
        // cannot anchor a regression and falls through to the fixed fraction.
        let knee = find_knee(strain, stress, config.knee_sensitivity).filter(|&k| k >= 2);

        let (modulus_mpa, modulus_from_fallback) = match knee {
            Some(k) => match linear_fit_slope(&strain[..=k], &stress[..=k]) {
                Some(slope) => (slope, false),
                None => (Self::fallback_modulus(strain, stress, config)?, true),
            },
            None => (Self::fallback_modulus(strain, stress, config)?, true),
        };

        let yield_point = knee.map(|k| (strain[k], stress[k]));
        let yield_stress_mpa = match knee {
            Some(k) => stress[k],
            None => Self::yield_from_slope_drop(strain, stress, modulus_mpa, config)
                .unwrap_or(stress[max_idx]),
        };

        // Strain energy density (MPa = MJ/m³ per unit strain) over the
        // effective volume; MPa·mm³ is millijoules.
        let energy_density = trapezoid(strain, stress);
        let kinetic_energy_j = energy_density * area_mm2 * geometry.gauge_length_mm * 1e-3;

        let mass_kg = config.mass_model.effective_mass_kg(geometry.gauge_length_mm);
        if mass_kg <= 0.0 {
            return Err(AnalysisError::DegenerateSample(format!(
                "non-positive effective mass {} kg",
                mass_kg
            )));
        }
        let velocity_m_s = if kinetic_energy_j > 0.0 {
            (2.0 * kinetic_energy_j / mass_kg).sqrt()
        } else {
            0.0
        };

        Ok(SampleAnalysis {
            properties: MaterialProperties {
                modulus_mpa,
                yield_stress_mpa,
                max_force_n,
                kinetic_energy_j,
                velocity_m_s,
                yield_point,
                modulus_from_fallback,
                geometry: geometry.clone(),
            },
            curve,
        })
    }

    /// Deterministic degraded-confidence path: regress over the first
    /// `fallback_fraction` of the prefix, at least 2 points.
    fn fallback_modulus(
        strain: &[f64],
        stress: &[f64],
        config: &AnalysisConfig,
    ) -> Result<f64, AnalysisError> {
        let n = strain.len();
        let count = ((n as f64 * config.fallback_fraction) as usize).clamp(2, n);
        linear_fit_slope(&strain[..count], &stress[..count]).ok_or_else(|| {
            AnalysisError::DegenerateSample(
                "zero strain variance in the modulus regression window".to_string(),
            )
        })
    }

    /// First point whose central-difference slope drops below
    /// `slope_drop_ratio` of the modulus.
    fn yield_from_slope_drop(
        strain: &[f64],
        stress: &[f64],
        modulus_mpa: f64,
        config: &AnalysisConfig,
    ) -> Option<f64> {
        let threshold = config.slope_drop_ratio * modulus_mpa;
        for i in 1..strain.len() - 1 {
            let dx = strain[i + 1] - strain[i - 1];
            if dx <= 0.0 {
                continue;
            }
            let slope = (stress[i + 1] - stress[i - 1]) / dx;
            if slope < threshold {
                return Some(stress[i]);
            }
        }
        None
    }
}

/// Index of the first occurrence of the maximum value.
fn argmax_first(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Least-squares slope of y over x. `None` when x has no variance.
fn linear_fit_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    if x.len() < 2 || x.len() != y.len() {
        return None;
    }
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        sxx += (xi - x_mean) * (xi - x_mean);
        sxy += (xi - x_mean) * (yi - y_mean);
    }
    if sxx <= 0.0 {
        return None;
    }
    Some(sxy / sxx)
}

/// Trapezoidal integral of y over x.
fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| 0.5 * (yw[0] + yw[1]) * (xw[1] - xw[0]))
        .sum()
}
