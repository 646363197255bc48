/// Quality score penalties
pub const PENALTY_WIND_MISSING: f64 = 5.0;
pub const PENALTY_ZERO_VISIBILITY: f64 = 3.0;
pub const PENALTY_EXTREME_HEAT: f64 = 5.0;
pub const PENALTY_EXTREME_COLD: f64 = 5.0;
pub const PENALTY_EXTREME_WIND: f64 = 10.0;

/// Extreme-value thresholds feeding the quality score
pub const EXTREME_HEAT_TEMP: f64 = 45.0;
pub const EXTREME_COLD_TEMP: f64 = -30.0;
pub const EXTREME_WIND_SPEED: f64 = 100.0;
