use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Northern-hemisphere meteorological season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Months {12,1,2} -> Winter, {3,4,5} -> Spring, {6,7,8} -> Summer,
    /// {9,10,11} -> Autumn.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3 | 4 | 5 => Season::Spring,
            6 | 7 | 8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

/// Temperature band, half-open intervals with inclusive lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempCategory {
    Freezing,
    Cold,
    Cool,
    Mild,
    Warm,
    Hot,
}

impl TempCategory {
    pub fn from_celsius(temp: f64) -> Self {
        if temp < 0.0 {
            TempCategory::Freezing
        } else if temp < 10.0 {
            TempCategory::Cold
        } else if temp < 20.0 {
            TempCategory::Cool
        } else if temp < 25.0 {
            TempCategory::Mild
        } else if temp < 30.0 {
            TempCategory::Warm
        } else {
            TempCategory::Hot
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TempCategory::Freezing => "Freezing",
            TempCategory::Cold => "Cold",
            TempCategory::Cool => "Cool",
            TempCategory::Mild => "Mild",
            TempCategory::Warm => "Warm",
            TempCategory::Hot => "Hot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HumidityCategory {
    Low,
    Moderate,
    High,
}

impl HumidityCategory {
    pub fn from_percent(humidity: i64) -> Self {
        if humidity < 30 {
            HumidityCategory::Low
        } else if humidity < 60 {
            HumidityCategory::Moderate
        } else {
            HumidityCategory::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HumidityCategory::Low => "Low",
            HumidityCategory::Moderate => "Moderate",
            HumidityCategory::High => "High",
        }
    }
}

/// Beaufort-like wind band over km/h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindCategory {
    Calm,
    Light,
    Gentle,
    Moderate,
    Fresh,
    Strong,
    Gale,
}

impl WindCategory {
    pub fn from_kmh(wind_speed: f64) -> Self {
        if wind_speed < 1.0 {
            WindCategory::Calm
        } else if wind_speed < 6.0 {
            WindCategory::Light
        } else if wind_speed < 12.0 {
            WindCategory::Gentle
        } else if wind_speed < 20.0 {
            WindCategory::Moderate
        } else if wind_speed < 29.0 {
            WindCategory::Fresh
        } else if wind_speed < 39.0 {
            WindCategory::Strong
        } else {
            WindCategory::Gale
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WindCategory::Calm => "Calm",
            WindCategory::Light => "Light",
            WindCategory::Gentle => "Gentle",
            WindCategory::Moderate => "Moderate",
            WindCategory::Fresh => "Fresh",
            WindCategory::Strong => "Strong",
            WindCategory::Gale => "Gale",
        }
    }
}

/// One observation as handed over by the ingestion boundary. Measurements are
/// optional because upstream payloads routinely omit them; the cleaner decides
/// which absences are defaultable and which are fatal for the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObservation {
    pub city: String,
    pub country: String,
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<i64>,
    pub pressure: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<i64>,
    pub cloudiness: Option<i64>,
    pub visibility: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Derived fields attached by the enricher. Kept separate from the measured
/// fields so a record that never reached enrichment maps onto nullable
/// database columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub date: NaiveDate,
    pub hour: u32,
    pub day_of_week: String,
    pub month: String,
    pub season: Season,
    pub temp_category: TempCategory,
    pub humidity_category: HumidityCategory,
    pub wind_category: WindCategory,
    pub comfort_index: f64,
    pub location: String,
    pub coord_string: String,
    pub quality_score: f64,
}

/// Canonical observation flowing through the pipeline stages.
///
/// The `#[validate]` ranges are the physical plausibility bounds; a record
/// failing any of them is rejected by the outlier validator stage.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Observation {
    pub city: String,
    pub country: String,
    pub timestamp: NaiveDateTime,

    #[validate(range(min = -60.0, max = 60.0))]
    pub temperature: f64,

    pub feels_like: f64,

    pub humidity: i64,

    #[validate(range(min = 800, max = 1100))]
    pub pressure: i64,

    pub description: String,

    #[validate(range(max = 200.0))]
    pub wind_speed: f64,

    pub wind_direction: i64,
    pub cloudiness: i64,
    pub visibility: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,

    /// True when the raw record carried no wind speed and the cleaner
    /// defaulted it to calm; feeds the quality score.
    #[serde(skip)]
    pub wind_was_missing: bool,

    pub enrichment: Option<Enrichment>,
}

impl Observation {
    /// Natural identity: `(city, country, timestamp floored to the hour)`.
    /// Two observations sharing this triple describe the same reading.
    pub fn natural_key(&self) -> (String, String, NaiveDateTime) {
        (
            self.city.clone(),
            self.country.clone(),
            floor_to_hour(self.timestamp),
        )
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.enrichment.as_ref().map(|e| e.quality_score)
    }
}

/// Truncate a timestamp to the start of its clock hour.
pub fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    let past_hour = i64::from(ts.minute()) * 60 + i64::from(ts.second());
    ts - Duration::seconds(past_hour) - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_season_mapping() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Autumn);
        assert_eq!(Season::from_month(11), Season::Autumn);
    }

    #[test]
    fn test_temp_category_boundaries() {
        assert_eq!(TempCategory::from_celsius(-0.1), TempCategory::Freezing);
        assert_eq!(TempCategory::from_celsius(0.0), TempCategory::Cold);
        assert_eq!(TempCategory::from_celsius(9.9), TempCategory::Cold);
        assert_eq!(TempCategory::from_celsius(10.0), TempCategory::Cool);
        assert_eq!(TempCategory::from_celsius(19.9), TempCategory::Cool);
        assert_eq!(TempCategory::from_celsius(20.0), TempCategory::Mild);
        assert_eq!(TempCategory::from_celsius(25.0), TempCategory::Warm);
        assert_eq!(TempCategory::from_celsius(30.0), TempCategory::Hot);
    }

    #[test]
    fn test_humidity_category_boundaries() {
        assert_eq!(HumidityCategory::from_percent(29), HumidityCategory::Low);
        assert_eq!(
            HumidityCategory::from_percent(30),
            HumidityCategory::Moderate
        );
        assert_eq!(
            HumidityCategory::from_percent(59),
            HumidityCategory::Moderate
        );
        assert_eq!(HumidityCategory::from_percent(60), HumidityCategory::High);
    }

    #[test]
    fn test_wind_category_boundaries() {
        assert_eq!(WindCategory::from_kmh(0.5), WindCategory::Calm);
        assert_eq!(WindCategory::from_kmh(1.0), WindCategory::Light);
        assert_eq!(WindCategory::from_kmh(6.0), WindCategory::Gentle);
        assert_eq!(WindCategory::from_kmh(12.0), WindCategory::Moderate);
        assert_eq!(WindCategory::from_kmh(20.0), WindCategory::Fresh);
        assert_eq!(WindCategory::from_kmh(29.0), WindCategory::Strong);
        assert_eq!(WindCategory::from_kmh(39.0), WindCategory::Gale);
        assert_eq!(WindCategory::from_kmh(150.0), WindCategory::Gale);
    }

    #[test]
    fn test_floor_to_hour() {
        let ts = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(14, 37, 52)
            .unwrap();
        let floored = floor_to_hour(ts);
        assert_eq!(
            floored,
            NaiveDate::from_ymd_opt(2024, 6, 15)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_natural_key_merges_same_hour() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let a = sample_observation(base.and_hms_opt(9, 5, 0).unwrap());
        let b = sample_observation(base.and_hms_opt(9, 55, 30).unwrap());
        assert_eq!(a.natural_key(), b.natural_key());
    }

    fn sample_observation(timestamp: NaiveDateTime) -> Observation {
        Observation {
            city: "London".to_string(),
            country: "GB".to_string(),
            timestamp,
            temperature: 15.5,
            feels_like: 15.0,
            humidity: 65,
            pressure: 1013,
            description: "light rain".to_string(),
            wind_speed: 10.0,
            wind_direction: 180,
            cloudiness: 40,
            visibility: 10.0,
            lat: 51.5074,
            lon: -0.1278,
            wind_was_missing: false,
            enrichment: None,
        }
    }
}
