//! Analysis Configuration Module
//! All tunable constants for loading and property extraction, JSON-loadable.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Effective mass model for the kinetic-energy to velocity conversion.
///
/// The mass is an assumed constant of the physical setup, not derivable from
/// the tensile data itself. Units: `constant` is kg, `per_length` is kg/m.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassModel {
    /// Fixed effective mass in kilograms.
    Constant(f64),
    /// Mass per unit length in kg/m, applied to the gauge length.
    PerLength(f64),
}

impl MassModel {
    /// Effective mass in kg for a specimen of the given gauge length (mm).
    pub fn effective_mass_kg(&self, gauge_length_mm: f64) -> f64 {
        match *self {
            MassModel::Constant(kg) => kg,
            MassModel::PerLength(kg_per_m) => kg_per_m * gauge_length_mm * 1e-3,
        }
    }
}

/// Tunable parameters for the analysis pipeline.
///
/// Every extraction call takes the full configuration explicitly, so batch
/// workers share no mutable state and results are reproducible.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum number of data rows required for a meaningful curve fit.
    pub min_rows: usize,
    /// Kneedle sensitivity: a knee must clear `sensitivity / (n - 1)` on the
    /// normalized difference curve to count. Higher values reject more noise.
    pub knee_sensitivity: f64,
    /// Fraction of the curve (up to the max-force point) used for the modulus
    /// regression when knee detection does not converge. At least 2 points.
    pub fallback_fraction: f64,
    /// Without a knee, yield is the first point whose local slope drops below
    /// this fraction of the modulus.
    pub slope_drop_ratio: f64,
    /// Mass assumption for the velocity conversion.
    pub mass_model: MassModel,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_rows: 5,
            knee_sensitivity: 1.0,
            fallback_fraction: 0.1,
            slope_drop_ratio: 0.9,
            // 45 g effective mass, from the original test rig.
            mass_model: MassModel::Constant(0.045),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file. Missing fields keep defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.min_rows, 5);
        assert!(cfg.fallback_fraction > 0.0 && cfg.fallback_fraction < 1.0);
        assert!(cfg.slope_drop_ratio > 0.0 && cfg.slope_drop_ratio < 1.0);
        assert_eq!(cfg.mass_model, MassModel::Constant(0.045));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{ "min_rows": 10 }"#).expect("valid JSON");
        assert_eq!(cfg.min_rows, 10);
        assert_eq!(cfg.slope_drop_ratio, 0.9);
    }

    #[test]
    fn mass_model_variants() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{ "mass_model": { "per_length": 0.2 } }"#)
                .expect("valid JSON");
        // 500 mm of line at 0.2 kg/m
        assert!((cfg.mass_model.effective_mass_kg(500.0) - 0.1).abs() < 1e-12);
        assert_eq!(MassModel::Constant(0.045).effective_mass_kg(500.0), 0.045);
    }
}
