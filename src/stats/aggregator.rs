//! Group Statistics Module
//! Aggregates per-sample properties into per-(group, length) mean ± std.

use crate::analysis::MaterialProperties;
use std::collections::BTreeMap;

/// Aggregation bucket: one group directory at one specimen length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub group: String,
    pub length_in: u32,
}

/// Mean and sample standard deviation of one property across a bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyStats {
    pub mean: f64,
    pub std: f64,
}

/// Aggregated statistics for one bucket.
#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub count: usize,
    pub max_force_n: PropertyStats,
    pub modulus_mpa: PropertyStats,
    pub yield_stress_mpa: PropertyStats,
    pub kinetic_energy_j: PropertyStats,
    pub velocity_m_s: PropertyStats,
    /// Shared specimen dimensions of the bucket, from its first member.
    pub length_mm: f64,
    pub diameter_mm: f64,
}

/// Statistics per bucket, rebuilt fully on each aggregation pass.
pub type GroupStatistics = BTreeMap<GroupKey, GroupSummary>;

pub struct Aggregator;

impl Aggregator {
    /// Group samples by (group, length) and compute per-property statistics.
    pub fn aggregate(samples: &[MaterialProperties]) -> GroupStatistics {
        let mut buckets: BTreeMap<GroupKey, Vec<&MaterialProperties>> = BTreeMap::new();
        for props in samples {
            let key = GroupKey {
                group: props.geometry.group.clone(),
                length_in: props.geometry.length_in,
            };
            buckets.entry(key).or_default().push(props);
        }

        buckets
            .into_iter()
            .map(|(key, members)| {
                let summary = GroupSummary {
                    count: members.len(),
                    max_force_n: Self::stats(members.iter().map(|p| p.max_force_n)),
                    modulus_mpa: Self::stats(members.iter().map(|p| p.modulus_mpa)),
                    yield_stress_mpa: Self::stats(members.iter().map(|p| p.yield_stress_mpa)),
                    kinetic_energy_j: Self::stats(members.iter().map(|p| p.kinetic_energy_j)),
                    velocity_m_s: Self::stats(members.iter().map(|p| p.velocity_m_s)),
                    length_mm: members[0].geometry.gauge_length_mm,
                    diameter_mm: members[0].geometry.diameter_mm,
                };
                (key, summary)
            })
            .collect()
    }

    /// Arithmetic mean and sample standard deviation (n−1 denominator).
    /// Single-sample buckets report std = 0 by convention, not as a
    /// statistical claim.
    fn stats<I: Iterator<Item = f64>>(values: I) -> PropertyStats {
        let values: Vec<f64> = values.collect();
        let n = values.len();
        if n == 0 {
            return PropertyStats::default();
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };
        PropertyStats { mean, std }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SpecimenGeometry;

    fn props(group: &str, length_in: u32, force: f64) -> MaterialProperties {
        MaterialProperties {
            modulus_mpa: 2.45,
            yield_stress_mpa: 1.85,
            max_force_n: force,
            kinetic_energy_j: 0.5,
            velocity_m_s: 4.7,
            yield_point: None,
            modulus_from_fallback: false,
            geometry: SpecimenGeometry {
                diameter_mm: 21.0,
                gauge_length_mm: f64::from(length_in) * 25.4,
                length_in,
                group: group.to_string(),
                crimp_type: "crimp".to_string(),
                test_run: 1,
            },
        }
    }

    #[test]
    fn identical_records_give_mean_and_zero_std() {
        let samples = vec![props("group_a", 5, 45.23); 4];
        let stats = Aggregator::aggregate(&samples);
        let key = GroupKey {
            group: "group_a".to_string(),
            length_in: 5,
        };
        let summary = &stats[&key];
        assert_eq!(summary.count, 4);
        assert_eq!(summary.max_force_n.mean, 45.23);
        assert_eq!(summary.max_force_n.std, 0.0);
        assert_eq!(summary.modulus_mpa.mean, 2.45);
    }

    #[test]
    fn two_samples_differing_by_delta() {
        let samples = vec![props("group_a", 5, 10.0), props("group_a", 5, 14.0)];
        let stats = Aggregator::aggregate(&samples);
        let summary = stats.values().next().expect("one bucket");
        assert_eq!(summary.max_force_n.mean, 12.0);
        // n−1 formula: std = Δ/√2 for two samples.
        let expected = 4.0 / 2.0_f64.sqrt();
        assert!((summary.max_force_n.std - expected).abs() < 1e-12);
    }

    #[test]
    fn single_sample_reports_zero_std() {
        let stats = Aggregator::aggregate(&[props("group_b", 8, 30.0)]);
        let summary = stats.values().next().expect("one bucket");
        assert_eq!(summary.count, 1);
        assert_eq!(summary.max_force_n.std, 0.0);
    }

    #[test]
    fn buckets_split_by_group_and_length() {
        let samples = vec![
            props("group_a", 5, 1.0),
            props("group_a", 8, 2.0),
            props("group_b", 5, 3.0),
        ];
        let stats = Aggregator::aggregate(&samples);
        assert_eq!(stats.len(), 3);
        assert!(stats.contains_key(&GroupKey {
            group: "group_a".to_string(),
            length_in: 8,
        }));
    }
}
