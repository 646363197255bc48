use tracing::warn;
use validator::Validate;

use crate::models::Observation;

/// Fourth pipeline stage: reject records outside physical plausibility
/// ranges. A record survives only when all range constraints hold
/// simultaneously; order among survivors is preserved.
///
/// The ranges themselves live as `#[validate(range)]` attributes on
/// [`Observation`]: temperature in [-60, 60] degrees C, pressure in
/// [800, 1100] hPa, wind speed at most 200 km/h, lat in [-90, 90],
/// lon in [-180, 180].
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, records: Vec<Observation>) -> Vec<Observation> {
        let initial_count = records.len();
        let valid: Vec<Observation> = records
            .into_iter()
            .filter(|record| record.validate().is_ok())
            .collect();

        let removed = initial_count - valid.len();
        if removed > 0 {
            warn!(removed, "removed records with out-of-range values");
        }

        valid
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn observation(city: &str) -> Observation {
        Observation {
            city: city.to_string(),
            country: "GB".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 7, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            temperature: 15.5,
            feels_like: 15.0,
            humidity: 65,
            pressure: 1013,
            description: "clear sky".to_string(),
            wind_speed: 10.0,
            wind_direction: 180,
            cloudiness: 20,
            visibility: 10.0,
            lat: 51.5074,
            lon: -0.1278,
            wind_was_missing: false,
            enrichment: None,
        }
    }

    #[test]
    fn test_valid_record_survives() {
        let valid = Validator::new().validate(vec![observation("London")]);
        assert_eq!(valid.len(), 1);
    }

    #[test]
    fn test_out_of_range_temperature_dropped() {
        let mut record = observation("Furnace");
        record.temperature = 999.0;
        assert!(Validator::new().validate(vec![record]).is_empty());
    }

    #[test]
    fn test_out_of_range_pressure_dropped() {
        let mut low = observation("A");
        low.pressure = 799;
        let mut high = observation("B");
        high.pressure = 1101;
        assert!(Validator::new().validate(vec![low, high]).is_empty());
    }

    #[test]
    fn test_extreme_wind_dropped() {
        let mut record = observation("Cyclone");
        record.wind_speed = 250.0;
        assert!(Validator::new().validate(vec![record]).is_empty());
    }

    #[test]
    fn test_bad_coordinates_dropped() {
        let mut record = observation("Offworld");
        record.lat = 200.0;
        assert!(Validator::new().validate(vec![record]).is_empty());

        let mut record = observation("Offmap");
        record.lon = -190.0;
        assert!(Validator::new().validate(vec![record]).is_empty());
    }

    #[test]
    fn test_boundary_values_survive() {
        let mut record = observation("Extreme");
        record.temperature = -60.0;
        record.pressure = 800;
        record.wind_speed = 200.0;
        record.lat = 90.0;
        record.lon = -180.0;
        assert_eq!(Validator::new().validate(vec![record]).len(), 1);
    }

    #[test]
    fn test_order_preserved_among_survivors() {
        let mut bad = observation("Bad");
        bad.temperature = 100.0;
        let survivors =
            Validator::new().validate(vec![observation("First"), bad, observation("Last")]);
        let cities: Vec<&str> = survivors.iter().map(|o| o.city.as_str()).collect();
        assert_eq!(cities, vec!["First", "Last"]);
    }
}
