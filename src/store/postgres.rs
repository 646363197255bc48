use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{DataSummary, LoadResult, Observation, QualityMetrics};
use crate::store::ObservationStore;

/// PostgreSQL-backed observation store.
///
/// This dialect resolves natural-key conflicts with the native
/// `ON CONFLICT (city, country, timestamp) DO UPDATE` clause, which updates
/// all measurement, descriptive, and derived fields in place while leaving
/// the surrogate id and `created_at` untouched.
pub struct PostgresStore {
    pool: PgPool,
}

const CREATE_OBSERVATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS weather_data (
    id SERIAL PRIMARY KEY,
    city VARCHAR(100) NOT NULL,
    country VARCHAR(10) NOT NULL,
    timestamp TIMESTAMP NOT NULL,
    date DATE NOT NULL,
    hour INTEGER NOT NULL,
    day_of_week VARCHAR(15) NOT NULL,
    month VARCHAR(15) NOT NULL,
    season VARCHAR(10) NOT NULL,
    temperature REAL NOT NULL,
    feels_like REAL NOT NULL,
    humidity INTEGER NOT NULL,
    pressure INTEGER NOT NULL,
    description VARCHAR(100) NOT NULL,
    wind_speed REAL NOT NULL,
    wind_direction INTEGER NOT NULL,
    cloudiness INTEGER NOT NULL,
    visibility REAL NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    temp_category VARCHAR(20),
    humidity_category VARCHAR(20),
    wind_category VARCHAR(20),
    comfort_index REAL,
    location VARCHAR(150),
    coord_string VARCHAR(50),
    quality_score REAL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(city, country, timestamp)
)
"#;

const CREATE_METRICS: &str = r#"
CREATE TABLE IF NOT EXISTS data_quality_metrics (
    id SERIAL PRIMARY KEY,
    load_timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    total_records_input INTEGER,
    total_records_output INTEGER,
    data_retention_rate REAL,
    average_quality_score REAL,
    missing_values_percentage REAL,
    unique_cities INTEGER,
    unique_countries INTEGER,
    timestamp_min TIMESTAMP,
    timestamp_max TIMESTAMP,
    metrics_json TEXT
)
"#;

const CREATE_LOAD_HISTORY: &str = r#"
CREATE TABLE IF NOT EXISTS load_history (
    id SERIAL PRIMARY KEY,
    load_timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    records_loaded INTEGER,
    records_updated INTEGER,
    records_failed INTEGER,
    load_duration_seconds REAL,
    status VARCHAR(20),
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

const INSERT_SQL: &str = "INSERT INTO weather_data (
    city, country, timestamp, date, hour, day_of_week, month, season,
    temperature, feels_like, humidity, pressure, description,
    wind_speed, wind_direction, cloudiness, visibility, lat, lon,
    temp_category, humidity_category, wind_category, comfort_index,
    location, coord_string, quality_score
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
)";

const UPSERT_CLAUSE: &str = "
ON CONFLICT (city, country, timestamp)
DO UPDATE SET
    date = EXCLUDED.date,
    hour = EXCLUDED.hour,
    day_of_week = EXCLUDED.day_of_week,
    month = EXCLUDED.month,
    season = EXCLUDED.season,
    temperature = EXCLUDED.temperature,
    feels_like = EXCLUDED.feels_like,
    humidity = EXCLUDED.humidity,
    pressure = EXCLUDED.pressure,
    description = EXCLUDED.description,
    wind_speed = EXCLUDED.wind_speed,
    wind_direction = EXCLUDED.wind_direction,
    cloudiness = EXCLUDED.cloudiness,
    visibility = EXCLUDED.visibility,
    lat = EXCLUDED.lat,
    lon = EXCLUDED.lon,
    temp_category = EXCLUDED.temp_category,
    humidity_category = EXCLUDED.humidity_category,
    wind_category = EXCLUDED.wind_category,
    comfort_index = EXCLUDED.comfort_index,
    location = EXCLUDED.location,
    coord_string = EXCLUDED.coord_string,
    quality_score = EXCLUDED.quality_score";

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        debug!("connected to postgres database");
        Ok(Self { pool })
    }
}

fn bind_observation<'q>(
    query: Query<'q, Postgres, PgArguments>,
    record: &'q Observation,
) -> Query<'q, Postgres, PgArguments> {
    let e = record.enrichment.as_ref();
    query
        .bind(&record.city)
        .bind(&record.country)
        .bind(record.timestamp)
        .bind(e.map(|e| e.date))
        .bind(e.map(|e| e.hour as i32))
        .bind(e.map(|e| e.day_of_week.as_str()))
        .bind(e.map(|e| e.month.as_str()))
        .bind(e.map(|e| e.season.as_str()))
        .bind(record.temperature)
        .bind(record.feels_like)
        .bind(record.humidity as i32)
        .bind(record.pressure as i32)
        .bind(&record.description)
        .bind(record.wind_speed)
        .bind(record.wind_direction as i32)
        .bind(record.cloudiness as i32)
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
impl ObservationStore for PostgresStore {
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
        let mut tx = self.pool.begin().await?;
        for record in records {
            bind_observation(sqlx::query(INSERT_SQL), record)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn replace_all(&self, records: &[Observation]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM weather_data")
            .execute(&mut *tx)
            .await?;
        for record in records {
            bind_observation(sqlx::query(INSERT_SQL), record)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn upsert(&self, record: &Observation) -> Result<()> {
        let sql = format!("{}{}", INSERT_SQL, UPSERT_CLAUSE);
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
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(metrics.total_records_input as i32)
        .bind(metrics.total_records_output as i32)
        .bind(metrics.data_retention_rate)
        .bind(metrics.average_quality_score)
        .bind(metrics.missing_values_percentage)
        .bind(metrics.unique_cities as i32)
        .bind(metrics.unique_countries as i32)
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
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(result.records_loaded as i32)
        .bind(result.records_updated as i32)
        .bind(result.records_failed as i32)
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
                AVG(temperature)::float8 as avg_temperature,
                AVG(humidity)::float8 as avg_humidity,
                AVG(quality_score)::float8 as avg_quality_score
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
