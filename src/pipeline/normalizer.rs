use crate::models::Observation;

/// Second pipeline stage: clamp numeric fields into their valid domains and
/// round to canonical precision. Never drops a record.
///
/// Rounding is half-away-from-zero (`f64::round` scaled by the precision
/// factor): 0.25 -> 0.3, -0.25 -> -0.3.
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, records: Vec<Observation>) -> Vec<Observation> {
        records.into_iter().map(Self::normalize_record).collect()
    }

    fn normalize_record(mut record: Observation) -> Observation {
        record.humidity = record.humidity.clamp(0, 100);
        record.cloudiness = record.cloudiness.clamp(0, 100);
        record.wind_direction = record.wind_direction.rem_euclid(360);
        record.visibility = record.visibility.max(0.0);

        record.temperature = round_to(record.temperature, 1);
        record.feels_like = round_to(record.feels_like, 1);
        record.wind_speed = round_to(record.wind_speed, 1);
        record.visibility = round_to(record.visibility, 1);
        record.lat = round_to(record.lat, 6);
        record.lon = round_to(record.lon, 6);

        record
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn observation() -> Observation {
        Observation {
            city: "London".to_string(),
            country: "GB".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            temperature: 12.345,
            feels_like: 11.96,
            humidity: 120,
            pressure: 1013,
            description: "mist".to_string(),
            wind_speed: 5.55,
            wind_direction: 450,
            cloudiness: -5,
            visibility: -2.0,
            lat: 51.50741234567,
            lon: -0.12781234567,
            wind_was_missing: false,
            enrichment: None,
        }
    }

    #[test]
    fn test_clamps_and_modulo() {
        let normalized = Normalizer::new().normalize(vec![observation()]);
        let record = &normalized[0];
        assert_eq!(record.humidity, 100);
        assert_eq!(record.cloudiness, 0);
        assert_eq!(record.wind_direction, 90);
        assert_eq!(record.visibility, 0.0);
    }

    #[test]
    fn test_negative_wind_direction_wraps_positive() {
        let mut record = observation();
        record.wind_direction = -90;
        let normalized = Normalizer::new().normalize(vec![record]);
        assert_eq!(normalized[0].wind_direction, 270);
    }

    #[test]
    fn test_precision_rounding() {
        let normalized = Normalizer::new().normalize(vec![observation()]);
        let record = &normalized[0];
        assert_eq!(record.temperature, 12.3);
        assert_eq!(record.feels_like, 12.0);
        assert_eq!(record.wind_speed, 5.6);
        assert_eq!(record.lat, 51.507412);
        assert_eq!(record.lon, -0.127812);
    }

    #[test]
    fn test_rounding_mode_half_away_from_zero() {
        assert_eq!(round_to(0.25, 1), 0.3);
        assert_eq!(round_to(-0.25, 1), -0.3);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_cardinality_preserved() {
        let records = vec![observation(), observation(), observation()];
        assert_eq!(Normalizer::new().normalize(records).len(), 3);
    }
}
