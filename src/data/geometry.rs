//! Specimen Geometry Module
//! Parses specimen dimensions and grouping metadata from the test-file path.
//!
//! Expected layout: `.../group_<G>/<L>in/<prefix>--<kind>-<ctype>-<D>--<run>.csv`
//! where `<D>` is the line diameter in mm and `<L>` the specimen length in
//! inches (converted to mm for gauge-length use).

use std::f64::consts::PI;
use std::path::Path;
use thiserror::Error;

/// Fallback dimensions used when a caller opts to analyze a file whose path
/// does not follow the naming convention.
pub const DEFAULT_DIAMETER_MM: f64 = 21.0;
pub const DEFAULT_LENGTH_IN: u32 = 10;

const MM_PER_INCH: f64 = 25.4;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Filename does not match '<prefix>--<kind>-<ctype>-<diameter>--<run>.csv': {0}")]
    UnmatchedFilename(String),
    #[error("No '<L>in' length directory in path: {0}")]
    MissingLengthDir(String),
    #[error("Non-positive specimen dimension (diameter {diameter_mm} mm, gauge {gauge_length_mm} mm)")]
    NonPositiveDimension { diameter_mm: f64, gauge_length_mm: f64 },
}

/// Specimen dimensions and grouping metadata for one test file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecimenGeometry {
    /// Line diameter in mm (circular cross-section assumed).
    pub diameter_mm: f64,
    /// Unstretched specimen length in mm, used to convert stroke to strain.
    pub gauge_length_mm: f64,
    /// Length bucket in inches, as named by the directory.
    pub length_in: u32,
    /// Group directory name (`group_*`), or "ungrouped".
    pub group: String,
    /// Crimp/termination type token from the filename.
    pub crimp_type: String,
    /// Test run index from the filename.
    pub test_run: u32,
}

impl SpecimenGeometry {
    /// Parse geometry from a file path. Pure function of the path string.
    pub fn from_path(path: &Path) -> Result<Self, GeometryError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let lossy = path.to_string_lossy().to_string();

        // Filename: split on "--", middle slug carries type and diameter.
        let slugs: Vec<&str> = stem.split("--").collect();
        if slugs.len() < 3 {
            return Err(GeometryError::UnmatchedFilename(lossy));
        }
        let size_tokens: Vec<&str> = slugs[1].split('-').collect();
        if size_tokens.len() < 3 {
            return Err(GeometryError::UnmatchedFilename(lossy));
        }
        let diameter_mm: f64 = size_tokens[size_tokens.len() - 1]
            .parse::<u32>()
            .map(f64::from)
            .map_err(|_| GeometryError::UnmatchedFilename(lossy.clone()))?;
        let crimp_type = size_tokens[size_tokens.len() - 2].to_string();
        let test_run: u32 = slugs[2]
            .parse()
            .map_err(|_| GeometryError::UnmatchedFilename(lossy.clone()))?;

        let length_in = parse_length_dir(path)
            .ok_or_else(|| GeometryError::MissingLengthDir(lossy.clone()))?;
        let gauge_length_mm = f64::from(length_in) * MM_PER_INCH;

        if diameter_mm <= 0.0 || gauge_length_mm <= 0.0 {
            return Err(GeometryError::NonPositiveDimension {
                diameter_mm,
                gauge_length_mm,
            });
        }

        Ok(Self {
            diameter_mm,
            gauge_length_mm,
            length_in,
            group: parse_group_dir(path),
            crimp_type,
            test_run,
        })
    }

    /// Default geometry for paths outside the naming convention. The caller
    /// decides whether to use this or abort; the parser itself never
    /// substitutes defaults.
    pub fn fallback(path: &Path) -> Self {
        Self {
            diameter_mm: DEFAULT_DIAMETER_MM,
            gauge_length_mm: f64::from(DEFAULT_LENGTH_IN) * MM_PER_INCH,
            length_in: parse_length_dir(path).unwrap_or(DEFAULT_LENGTH_IN),
            group: parse_group_dir(path),
            crimp_type: "crimp".to_string(),
            test_run: 0,
        }
    }

    /// Cross-sectional area in mm², assuming a circular cross-section.
    pub fn cross_section_area_mm2(&self) -> f64 {
        PI * (self.diameter_mm / 2.0).powi(2)
    }
}

/// Find a `<digits>in` component in the path and return the inch count.
fn parse_length_dir(path: &Path) -> Option<u32> {
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if let Some(digits) = name.strip_suffix("in") {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(inches) = digits.parse::<u32>() {
                    if inches > 0 {
                        return Some(inches);
                    }
                }
            }
        }
    }
    None
}

/// Find a `group_*` component in the path, defaulting to "ungrouped".
fn parse_group_dir(path: &Path) -> String {
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.starts_with("group_") {
            return name.to_string();
        }
    }
    "ungrouped".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_conventional_path() {
        let path = PathBuf::from("data/group_a/5in/test--line-crimp-21--3.csv");
        let geom = SpecimenGeometry::from_path(&path).expect("conventional path");
        assert_eq!(geom.diameter_mm, 21.0);
        assert_eq!(geom.length_in, 5);
        assert!((geom.gauge_length_mm - 127.0).abs() < 1e-12);
        assert_eq!(geom.group, "group_a");
        assert_eq!(geom.crimp_type, "crimp");
        assert_eq!(geom.test_run, 3);
    }

    #[test]
    fn rejects_unmatched_filename() {
        let path = PathBuf::from("data/group_a/5in/readme.csv");
        assert!(matches!(
            SpecimenGeometry::from_path(&path),
            Err(GeometryError::UnmatchedFilename(_))
        ));
    }

    #[test]
    fn rejects_missing_length_dir() {
        let path = PathBuf::from("data/group_a/test--line-crimp-21--3.csv");
        assert!(matches!(
            SpecimenGeometry::from_path(&path),
            Err(GeometryError::MissingLengthDir(_))
        ));
    }

    #[test]
    fn rejects_zero_length_dir() {
        let path = PathBuf::from("data/group_a/0in/test--line-crimp-21--3.csv");
        assert!(matches!(
            SpecimenGeometry::from_path(&path),
            Err(GeometryError::MissingLengthDir(_))
        ));
    }

    #[test]
    fn fallback_keeps_path_metadata() {
        let path = PathBuf::from("data/group_b/8in/whatever.csv");
        let geom = SpecimenGeometry::fallback(&path);
        assert_eq!(geom.diameter_mm, DEFAULT_DIAMETER_MM);
        assert_eq!(geom.length_in, 8);
        assert_eq!(geom.group, "group_b");
    }

    #[test]
    fn area_of_unit_diameter() {
        let geom = SpecimenGeometry {
            diameter_mm: 2.0,
            gauge_length_mm: 100.0,
            length_in: 4,
            group: "group_a".to_string(),
            crimp_type: "crimp".to_string(),
            test_run: 1,
        };
        assert!((geom.cross_section_area_mm2() - std::f64::consts::PI).abs() < 1e-12);
    }
}
