use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::models::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Writes transformed records to a file for inspection or downstream
/// consumers outside the database path.
pub struct RecordExporter;

/// Flattened row shape for CSV output; derived columns stay empty when a
/// record was never enriched.
#[derive(Serialize)]
struct ExportRow<'a> {
    city: &'a str,
    country: &'a str,
    timestamp: NaiveDateTime,
    temperature: f64,
    feels_like: f64,
    humidity: i64,
    pressure: i64,
    description: &'a str,
    wind_speed: f64,
    wind_direction: i64,
    cloudiness: i64,
    visibility: f64,
    lat: f64,
    lon: f64,
    date: Option<NaiveDate>,
    hour: Option<u32>,
    day_of_week: Option<&'a str>,
    month: Option<&'a str>,
    season: Option<&'a str>,
    temp_category: Option<&'a str>,
    humidity_category: Option<&'a str>,
    wind_category: Option<&'a str>,
    comfort_index: Option<f64>,
    location: Option<&'a str>,
    coord_string: Option<&'a str>,
    quality_score: Option<f64>,
}

impl<'a> ExportRow<'a> {
    fn from_observation(record: &'a Observation) -> Self {
        let e = record.enrichment.as_ref();
        Self {
            city: &record.city,
            country: &record.country,
            timestamp: record.timestamp,
            temperature: record.temperature,
            feels_like: record.feels_like,
            humidity: record.humidity,
            pressure: record.pressure,
            description: &record.description,
            wind_speed: record.wind_speed,
            wind_direction: record.wind_direction,
            cloudiness: record.cloudiness,
            visibility: record.visibility,
            lat: record.lat,
            lon: record.lon,
            date: e.map(|e| e.date),
            hour: e.map(|e| e.hour),
            day_of_week: e.map(|e| e.day_of_week.as_str()),
            month: e.map(|e| e.month.as_str()),
            season: e.map(|e| e.season.as_str()),
            temp_category: e.map(|e| e.temp_category.as_str()),
            humidity_category: e.map(|e| e.humidity_category.as_str()),
            wind_category: e.map(|e| e.wind_category.as_str()),
            comfort_index: e.map(|e| e.comfort_index),
            location: e.map(|e| e.location.as_str()),
            coord_string: e.map(|e| e.coord_string.as_str()),
            quality_score: e.map(|e| e.quality_score),
        }
    }
}

impl RecordExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn export(
        &self,
        records: &[Observation],
        path: &Path,
        format: ExportFormat,
    ) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match format {
            ExportFormat::Csv => self.write_csv(records, path)?,
            ExportFormat::Json => self.write_json(records, path)?,
        }

        info!(records = records.len(), path = %path.display(), "exported records");
        Ok(())
    }

    fn write_csv(&self, records: &[Observation], path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(ExportRow::from_observation(record))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(&self, records: &[Observation], path: &Path) -> Result<()> {
        let rows: Vec<ExportRow> = records.iter().map(ExportRow::from_observation).collect();
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &rows)?;
        Ok(())
    }
}

impl Default for RecordExporter {
    fn default() -> Self {
        Self::new()
    }
}
