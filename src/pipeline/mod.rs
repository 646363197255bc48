pub mod cleaner;
pub mod enricher;
pub mod metrics;
pub mod normalizer;
pub mod validator;

pub use cleaner::Cleaner;
pub use enricher::Enricher;
pub use metrics::MetricsCollector;
pub use normalizer::Normalizer;
pub use validator::Validator;

use crate::models::{Observation, QualityMetrics, RawObservation};
use tracing::{info, warn};

/// The full transform pipeline: clean -> normalize -> enrich -> validate,
/// plus quality metrics over the survivors.
///
/// Each stage consumes the previous stage's complete output; nothing is
/// streamed across stages.
pub struct Pipeline {
    cleaner: Cleaner,
    normalizer: Normalizer,
    enricher: Enricher,
    validator: Validator,
    collector: MetricsCollector,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            cleaner: Cleaner::new(),
            normalizer: Normalizer::new(),
            enricher: Enricher::new(),
            validator: Validator::new(),
            collector: MetricsCollector::new(),
        }
    }

    pub fn transform(&self, raw: Vec<RawObservation>) -> (Vec<Observation>, QualityMetrics) {
        if raw.is_empty() {
            warn!("no observations provided for transformation");
            return (Vec::new(), QualityMetrics::empty(0));
        }

        let original_count = raw.len();
        info!(records = original_count, "starting transformation");

        let records = self.cleaner.clean(raw);
        let records = self.normalizer.normalize(records);
        let records = self.enricher.enrich(records);
        let records = self.validator.validate(records);

        let metrics = self.collector.summarize(&records, original_count);

        info!(
            input = original_count,
            output = records.len(),
            "transformation completed"
        );
        (records, metrics)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(city: &str, temp: f64, humidity: i64) -> RawObservation {
        RawObservation {
            city: city.to_string(),
            country: "GB".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 7, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            temperature: Some(temp),
            feels_like: Some(temp),
            humidity: Some(humidity),
            pressure: Some(1013),
            description: Some("Clear Sky".to_string()),
            wind_speed: Some(10.0),
            wind_direction: Some(180),
            cloudiness: Some(20),
            visibility: Some(10.0),
            lat: Some(51.5074),
            lon: Some(-0.1278),
        }
    }

    #[test]
    fn test_empty_input_is_noop() {
        let (records, metrics) = Pipeline::new().transform(Vec::new());
        assert!(records.is_empty());
        assert_eq!(metrics.total_records_input, 0);
        assert_eq!(metrics.data_retention_rate, 0.0);
    }

    #[test]
    fn test_single_record_scenario() {
        // London/GB, 15.5 degrees, 65% humidity -> Cool / High / score 100
        let (records, metrics) = Pipeline::new().transform(vec![raw("London", 15.5, 65)]);
        assert_eq!(records.len(), 1);

        let enrichment = records[0].enrichment.as_ref().unwrap();
        assert_eq!(enrichment.temp_category.as_str(), "Cool");
        assert_eq!(enrichment.humidity_category.as_str(), "High");
        assert_eq!(enrichment.quality_score, 100.0);
        assert_eq!(metrics.total_records_output, 1);
        assert_eq!(metrics.data_retention_rate, 1.0);
    }

    #[test]
    fn test_moderate_humidity_band() {
        let (records, _) = Pipeline::new().transform(vec![raw("London", 15.5, 50)]);
        let enrichment = records[0].enrichment.as_ref().unwrap();
        assert_eq!(enrichment.humidity_category.as_str(), "Moderate");
    }

    #[test]
    fn test_outlier_reduces_retention() {
        let mut bad = raw("Nowhere", 999.0, 50);
        bad.lat = Some(200.0);
        let (records, metrics) = Pipeline::new().transform(vec![raw("London", 15.5, 65), bad]);
        assert_eq!(records.len(), 1);
        assert_eq!(metrics.total_records_input, 2);
        assert_eq!(metrics.total_records_output, 1);
        assert!(metrics.data_retention_rate < 1.0);
    }

    #[test]
    fn test_retention_monotonicity() {
        let input: Vec<RawObservation> = (0..10).map(|i| raw(&format!("City{}", i), 20.0, 50)).collect();
        let (records, metrics) = Pipeline::new().transform(input);
        assert!(metrics.total_records_output <= metrics.total_records_input);
        assert_eq!(records.len(), metrics.total_records_output);
    }
}
