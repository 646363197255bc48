use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::models::observation::floor_to_hour;
use crate::models::{Observation, RawObservation};
use crate::utils::title_case;

/// First pipeline stage: de-duplicate, default defaultable absences, drop
/// records missing load-bearing fields, and normalize text casing.
pub struct Cleaner;

impl Cleaner {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, raw: Vec<RawObservation>) -> Vec<Observation> {
        let input_count = raw.len();

        // Duplicates are keyed on the raw city/country strings plus the
        // hour-floored timestamp; the first-seen record wins.
        let mut seen: HashSet<(String, String, NaiveDateTime)> = HashSet::new();
        let mut deduped: Vec<RawObservation> = Vec::with_capacity(raw.len());
        for record in raw {
            let key = (
                record.city.clone(),
                record.country.clone(),
                floor_to_hour(record.timestamp),
            );
            if seen.insert(key) {
                deduped.push(record);
            }
        }

        if deduped.len() < input_count {
            debug!(
                removed = input_count - deduped.len(),
                "removed duplicate records"
            );
        }

        // Visibility defaults to the batch median of the non-missing values.
        let median_visibility = median(
            deduped
                .iter()
                .filter_map(|r| r.visibility)
                .collect::<Vec<_>>(),
        )
        .unwrap_or(0.0);

        let before_missing = deduped.len();
        let cleaned: Vec<Observation> = deduped
            .into_iter()
            .filter_map(|r| Self::build_observation(r, median_visibility))
            .collect();

        if cleaned.len() < before_missing {
            warn!(
                removed = before_missing - cleaned.len(),
                "removed records with missing critical data"
            );
        }

        cleaned
    }

    /// Apply the missing-value policy and text normalization. Returns None
    /// when a critical field (temperature, humidity, pressure, lat, lon) is
    /// absent; those have no safe default.
    fn build_observation(raw: RawObservation, median_visibility: f64) -> Option<Observation> {
        let temperature = raw.temperature?;
        let humidity = raw.humidity?;
        let pressure = raw.pressure?;
        let lat = raw.lat?;
        let lon = raw.lon?;

        let wind_was_missing = raw.wind_speed.is_none();

        Some(Observation {
            city: title_case(&raw.city),
            country: raw.country.trim().to_uppercase(),
            timestamp: raw.timestamp,
            temperature,
            feels_like: raw.feels_like.unwrap_or(temperature),
            humidity,
            pressure,
            description: raw
                .description
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_lowercase(),
            // Absent wind data is read as calm conditions.
            wind_speed: raw.wind_speed.unwrap_or(0.0),
            wind_direction: raw.wind_direction.unwrap_or(0),
            cloudiness: raw.cloudiness.unwrap_or(0),
            visibility: raw.visibility.unwrap_or(median_visibility),
            lat,
            lon,
            wind_was_missing,
            enrichment: None,
        })
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn raw_at(city: &str, hour: u32, minute: u32, temp: Option<f64>) -> RawObservation {
        RawObservation {
            city: city.to_string(),
            country: "GB".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
            temperature: temp,
            feels_like: temp,
            humidity: Some(50),
            pressure: Some(1010),
            description: Some("  Scattered Clouds ".to_string()),
            wind_speed: Some(5.0),
            wind_direction: Some(90),
            cloudiness: Some(30),
            visibility: Some(8.0),
            lat: Some(51.5),
            lon: Some(-0.1),
        }
    }

    #[test]
    fn test_same_hour_duplicates_keep_first() {
        let mut first = raw_at("London", 10, 5, Some(12.0));
        first.temperature = Some(12.0);
        let mut second = raw_at("London", 10, 45, Some(18.0));
        second.temperature = Some(18.0);

        let cleaned = Cleaner::new().clean(vec![first, second]);
        assert_eq!(cleaned.len(), 1);
        // The later-arriving record was discarded.
        assert_eq!(cleaned[0].temperature, 12.0);
    }

    #[test]
    fn test_different_hours_are_distinct() {
        let cleaned = Cleaner::new().clean(vec![
            raw_at("London", 10, 30, Some(12.0)),
            raw_at("London", 11, 30, Some(12.0)),
        ]);
        assert_eq!(cleaned.len(), 2);
    }

    #[test]
    fn test_missing_critical_field_drops_record() {
        let cleaned = Cleaner::new().clean(vec![
            raw_at("London", 10, 0, None),
            raw_at("Paris", 10, 0, Some(9.0)),
        ]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].city, "Paris");
    }

    #[test]
    fn test_missing_wind_defaults_to_calm() {
        let mut record = raw_at("London", 10, 0, Some(12.0));
        record.wind_speed = None;
        record.wind_direction = None;

        let cleaned = Cleaner::new().clean(vec![record]);
        assert_eq!(cleaned[0].wind_speed, 0.0);
        assert_eq!(cleaned[0].wind_direction, 0);
        assert!(cleaned[0].wind_was_missing);
    }

    #[test]
    fn test_missing_visibility_takes_batch_median() {
        let mut a = raw_at("London", 10, 0, Some(12.0));
        a.visibility = Some(4.0);
        let mut b = raw_at("Paris", 10, 0, Some(12.0));
        b.visibility = Some(10.0);
        let mut c = raw_at("Berlin", 10, 0, Some(12.0));
        c.visibility = None;

        let cleaned = Cleaner::new().clean(vec![a, b, c]);
        let berlin = cleaned.iter().find(|o| o.city == "Berlin").unwrap();
        assert_eq!(berlin.visibility, 7.0);
    }

    #[test]
    fn test_text_normalization() {
        let mut record = raw_at("  new   york ", 10, 0, Some(12.0));
        record.country = "us".to_string();

        let cleaned = Cleaner::new().clean(vec![record]);
        assert_eq!(cleaned[0].city, "New York");
        assert_eq!(cleaned[0].country, "US");
        assert_eq!(cleaned[0].description, "scattered clouds");
    }

    #[test]
    fn test_median_even_count() {
        assert_eq!(median(vec![1.0, 3.0, 2.0, 4.0]), Some(2.5));
        assert_eq!(median(vec![5.0]), Some(5.0));
        assert_eq!(median(Vec::new()), None);
    }
}
