use std::collections::HashSet;

use crate::models::{Observation, QualityMetrics};

/// Number of columns a fully enriched record occupies; the denominator for
/// the missing-values percentage.
const TOTAL_FIELDS: usize = 26;
/// Columns that stay empty when a record never reached enrichment.
const DERIVED_FIELDS: usize = 12;

/// Final pipeline stage: aggregate quality figures over the surviving record
/// set. A pure function of the final records and the caller-supplied original
/// count; it never re-reads earlier pipeline stages.
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, records: &[Observation], original_count: usize) -> QualityMetrics {
        if records.is_empty() {
            return QualityMetrics::empty(original_count);
        }

        let retention = if original_count > 0 {
            records.len() as f64 / original_count as f64
        } else {
            0.0
        };

        let scored: Vec<f64> = records.iter().filter_map(|r| r.quality_score()).collect();
        let average_quality_score = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        };

        let missing_cells: usize = records
            .iter()
            .map(|r| if r.enrichment.is_none() { DERIVED_FIELDS } else { 0 })
            .sum();
        let missing_values_percentage =
            missing_cells as f64 / (records.len() * TOTAL_FIELDS) as f64 * 100.0;

        let cities: HashSet<&str> = records.iter().map(|r| r.city.as_str()).collect();
        let countries: HashSet<&str> = records.iter().map(|r| r.country.as_str()).collect();

        QualityMetrics {
            total_records_input: original_count,
            total_records_output: records.len(),
            data_retention_rate: retention,
            average_quality_score,
            missing_values_percentage,
            unique_cities: cities.len(),
            unique_countries: countries.len(),
            timestamp_min: records.iter().map(|r| r.timestamp).min(),
            timestamp_max: records.iter().map(|r| r.timestamp).max(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
