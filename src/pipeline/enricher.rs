use chrono::{Datelike, Timelike};

use crate::models::{
    Enrichment, HumidityCategory, Observation, Season, TempCategory, WindCategory,
};
use crate::pipeline::normalizer::round_to;
use crate::utils::constants::{
    EXTREME_COLD_TEMP, EXTREME_HEAT_TEMP, EXTREME_WIND_SPEED, PENALTY_EXTREME_COLD,
    PENALTY_EXTREME_HEAT, PENALTY_EXTREME_WIND, PENALTY_WIND_MISSING, PENALTY_ZERO_VISIBILITY,
};

/// Third pipeline stage: attach derived temporal fields, categorical bins,
/// the comfort index, and the per-record quality score. Cardinality is
/// preserved.
pub struct Enricher;

impl Enricher {
    pub fn new() -> Self {
        Self
    }

    pub fn enrich(&self, records: Vec<Observation>) -> Vec<Observation> {
        records
            .into_iter()
            .map(|mut record| {
                record.enrichment = Some(Self::derive(&record));
                record
            })
            .collect()
    }

    fn derive(record: &Observation) -> Enrichment {
        Enrichment {
            date: record.timestamp.date(),
            hour: record.timestamp.hour(),
            day_of_week: record.timestamp.format("%A").to_string(),
            month: record.timestamp.format("%B").to_string(),
            season: Season::from_month(record.timestamp.month()),
            temp_category: TempCategory::from_celsius(record.temperature),
            humidity_category: HumidityCategory::from_percent(record.humidity),
            wind_category: WindCategory::from_kmh(record.wind_speed),
            comfort_index: comfort_index(record.temperature, record.humidity),
            location: format!("{}, {}", record.city, record.country),
            coord_string: format!("{},{}", record.lat, record.lon),
            quality_score: quality_score(record),
        }
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new()
    }
}

/// Simplified apparent-temperature model: the index starts at the air
/// temperature and shifts for humidity outside the 30-70% band. The
/// coefficients are part of the reproducibility contract, not a physical
/// heat-index formula.
fn comfort_index(temperature: f64, humidity: i64) -> f64 {
    let mut comfort = temperature;
    if humidity > 70 {
        comfort += (humidity - 70) as f64 * 0.1;
    } else if humidity < 30 {
        comfort -= (30 - humidity) as f64 * 0.05;
    }
    round_to(comfort, 1)
}

/// Penalty-based confidence score in [0, 100]. Penalties are additive and
/// independent; several can apply to one record.
fn quality_score(record: &Observation) -> f64 {
    let mut score = 100.0;

    if record.wind_was_missing {
        score -= PENALTY_WIND_MISSING;
    }
    if record.visibility == 0.0 {
        score -= PENALTY_ZERO_VISIBILITY;
    }
    if record.temperature > EXTREME_HEAT_TEMP {
        score -= PENALTY_EXTREME_HEAT;
    }
    if record.temperature < EXTREME_COLD_TEMP {
        score -= PENALTY_EXTREME_COLD;
    }
    if record.wind_speed > EXTREME_WIND_SPEED {
        score -= PENALTY_EXTREME_WIND;
    }

    score.clamp(0.0, 100.0)
}
