use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{DataSummary, LoadResult, Observation, QualityMetrics};
use crate::store::ObservationStore;

/// SQLite-backed observation store.
///
/// This dialect resolves natural-key conflicts with a replace-on-conflict
/// insert (`INSERT OR REPLACE`), SQLite's native primitive for
/// last-write-wins upserts.
pub struct SqliteStore {
    pool: SqlitePool,
}

const CREATE_OBSERVATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS weather_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    city TEXT NOT NULL,
    country TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    date TEXT NOT NULL,
    hour INTEGER NOT NULL,
    day_of_week TEXT NOT NULL,
    month TEXT NOT NULL,
    season TEXT NOT NULL,
    temperature REAL NOT NULL,
    feels_like REAL NOT NULL,
    humidity INTEGER NOT NULL,
    pressure INTEGER NOT NULL,
    description TEXT NOT NULL,
    wind_speed REAL NOT NULL,
    wind_direction INTEGER NOT NULL,
    cloudiness INTEGER NOT NULL,
    visibility REAL NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    temp_category TEXT,
    humidity_category TEXT,
    wind_category TEXT,
    comfort_index REAL,
    location TEXT,
    coord_string TEXT,
    quality_score REAL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(city, country, timestamp)
)
"#;

const CREATE_METRICS: &str = r#"
CREATE TABLE IF NOT EXISTS data_quality_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    load_timestamp TEXT DEFAULT CURRENT_TIMESTAMP,
    total_records_input INTEGER,
    total_records_output INTEGER,
    data_retention_rate REAL,
    average_quality_score REAL,
    missing_values_percentage REAL,
    unique_cities INTEGER,
    unique_countries INTEGER,
    timestamp_min TEXT,
    timestamp_max TEXT,
    metrics_json TEXT
)
"#;

const CREATE_LOAD_HISTORY: &str = r#"
CREATE TABLE IF NOT EXISTS load_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    load_timestamp TEXT DEFAULT CURRENT_TIMESTAMP,
    records_loaded INTEGER,
    records_updated INTEGER,
    records_failed INTEGER,
    load_duration_seconds REAL,
    status TEXT,
    error_message TEXT,
    source_info TEXT
)
"#;

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_weather_city_timestamp ON weather_data(city, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_weather_country_date ON weather_data(country, date)",
    "CREATE INDEX IF NOT EXISTS idx_weather_timestamp ON weather_data(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_weather_location ON weather_data(lat, lon)",
    "CREATE INDEX IF NOT EXISTS idx_weather_quality ON weather_data(quality_score)",
];

const OBSERVATION_COLUMNS: &str = "city, country, timestamp, date, hour, day_of_week, month, season, \
     temperature, feels_like, humidity, pressure, description, \
     wind_speed, wind_direction, cloudiness, visibility, lat, lon, \
     temp_category, humidity_category, wind_category, comfort_index, \
     location, coord_string, quality_score";

const PLACEHOLDERS: &str = "?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?";

impl SqliteStore {
    /// Open (and create if missing) a SQLite database. Accepts a plain file
    /// path or a `sqlite:` URL, including `sqlite::memory:`.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = if path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)?.create_if_missing(true)
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        };

        // One connection: the loader is the sole owner of this handle and
        // in-memory databases exist per connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        debug!(path, "connected to sqlite database");
        Ok(Self { pool })
    }
}

fn bind_observation<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &'q Observation,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    let e = record.enrichment.as_ref();
    query
        .bind(&record.city)
        .bind(&record.country)
        .bind(record.timestamp)
        .bind(e.map(|e| e.date))
        .bind(e.map(|e| i64::from(e.hour)))
        .bind(e.map(|e| e.day_of_week.as_str()))
        .bind(e.map(|e| e.month.as_str()))
        .bind(e.map(|e| e.season.as_str()))
        .bind(record.temperature)
        .bind(record.feels_like)
        .bind(record.humidity)
        .bind(record.pressure)
        .bind(&record.description)
        .bind(record.wind_speed)
        .bind(record.wind_direction)
        .bind(record.cloudiness)
        .bind(record.visibility)
        .bind(record.lat)
        .bind(record.lon)
        .bind(e.map(|e| e.temp_category.as_str()))
        .bind(e.map(|e| e.humidity_category.as_str()))
        .bind(e.map(|e| e.wind_category.as_str()))
        .bind(e.map(|e| e.comfort_index))
        .bind(e.map(|e| e.location.as_str()))
        .bind(e.map(|e| e.coord_string.as_str()))
        .bind(e.map(|e| e.quality_score))
}

#[async_trait]
impl ObservationStore for SqliteStore {
    async fn ensure_schema(&self) -> Result<()> {
        for table_sql in [CREATE_OBSERVATIONS, CREATE_METRICS, CREATE_LOAD_HISTORY] {
            sqlx::query(table_sql).execute(&self.pool).await?;
        }

        for index_sql in INDEXES {
            if let Err(e) = sqlx::query(index_sql).execute(&self.pool).await {
                warn!(error = %e, "failed to create index");
            }
        }

        Ok(())
    }

    async fn insert_all(&self, records: &[Observation]) -> Result<u64> {
        let sql = format!(
            "INSERT INTO weather_data ({}) VALUES ({})",
            OBSERVATION_COLUMNS, PLACEHOLDERS
        );

        let mut tx = self.pool.begin().await?;
        for record in records {
            bind_observation(sqlx::query(&sql), record)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn replace_all(&self, records: &[Observation]) -> Result<u64> {
        let sql = format!(
            "INSERT INTO weather_data ({}) VALUES ({})",
            OBSERVATION_COLUMNS, PLACEHOLDERS
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM weather_data")
            .execute(&mut *tx)
            .await?;
        for record in records {
            bind_observation(sqlx::query(&sql), record)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn upsert(&self, record: &Observation) -> Result<()> {
        let sql = format!(
            "INSERT OR REPLACE INTO weather_data ({}) VALUES ({})",
            OBSERVATION_COLUMNS, PLACEHOLDERS
        );

        bind_observation(sqlx::query(&sql), record)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_quality_metrics(&self, metrics: &QualityMetrics) -> Result<()> {
        let metrics_json = serde_json::to_string(metrics)?;
        sqlx::query(
            "INSERT INTO data_quality_metrics (
                total_records_input, total_records_output, data_retention_rate,
                average_quality_score, missing_values_percentage, unique_cities,
                unique_countries, timestamp_min, timestamp_max, metrics_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(metrics.total_records_input as i64)
        .bind(metrics.total_records_output as i64)
        .bind(metrics.data_retention_rate)
        .bind(metrics.average_quality_score)
        .bind(metrics.missing_values_percentage)
        .bind(metrics.unique_cities as i64)
        .bind(metrics.unique_countries as i64)
        .bind(metrics.timestamp_min)
        .bind(metrics.timestamp_max)
        .bind(metrics_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_load_history(&self, result: &LoadResult, source_info: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO load_history (
                records_loaded, records_updated, records_failed,
                load_duration_seconds, status, error_message, source_info
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(result.records_loaded as i64)
        .bind(result.records_updated as i64)
        .bind(result.records_failed as i64)
        .bind(result.load_duration_seconds)
        .bind(result.status.as_str())
        .bind(result.error_message.as_deref())
        .bind(source_info)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn data_summary(&self) -> Result<DataSummary> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) as total_records,
                COUNT(DISTINCT city) as unique_cities,
                COUNT(DISTINCT country) as unique_countries,
                MIN(timestamp) as earliest_data,
                MAX(timestamp) as latest_data,
                AVG(temperature) as avg_temperature,
                AVG(humidity) as avg_humidity,
                AVG(quality_score) as avg_quality_score
            FROM weather_data",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DataSummary {
            total_records: row.try_get("total_records")?,
            unique_cities: row.try_get("unique_cities")?,
            unique_countries: row.try_get("unique_countries")?,
            earliest_data: row.try_get("earliest_data")?,
            latest_data: row.try_get("latest_data")?,
            avg_temperature: row.try_get("avg_temperature")?,
            avg_humidity: row.try_get("avg_humidity")?,
            avg_quality_score: row.try_get("avg_quality_score")?,
        })
    }
}
