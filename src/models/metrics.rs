use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Aggregate quality figures for one transformation run. Produced by the
/// metrics collector from the final record set plus the caller-supplied
/// original count; persisted append-only to the metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub total_records_input: usize,
    pub total_records_output: usize,
    pub data_retention_rate: f64,
    pub average_quality_score: f64,
    pub missing_values_percentage: f64,
    pub unique_cities: usize,
    pub unique_countries: usize,
    pub timestamp_min: Option<NaiveDateTime>,
    pub timestamp_max: Option<NaiveDateTime>,
}

impl QualityMetrics {
    /// Metrics for a run that produced nothing (including zero-input runs,
    /// where the retention rate is defined as 0 rather than a division error).
    pub fn empty(total_records_input: usize) -> Self {
        Self {
            total_records_input,
            total_records_output: 0,
            data_retention_rate: 0.0,
            average_quality_score: 0.0,
            missing_values_percentage: 0.0,
            unique_cities: 0,
            unique_countries: 0,
            timestamp_min: None,
            timestamp_max: None,
        }
    }
}

/// Outcome of one load call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Success,
    Failed,
    Skipped,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Success => "success",
            LoadStatus::Failed => "failed",
            LoadStatus::Skipped => "skipped",
        }
    }
}

/// How a batch is applied against existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoadStrategy {
    /// Plain inserts; any duplicate-key violation fails the whole call.
    Insert,
    /// Per-row conflict resolution on the natural key; the default.
    Upsert,
    /// Clear the observations table and reload from scratch.
    Replace,
}

impl LoadStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStrategy::Insert => "insert",
            LoadStrategy::Upsert => "upsert",
            LoadStrategy::Replace => "replace",
        }
    }
}

/// Per-call load statistics, appended to the load-history ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub records_loaded: usize,
    pub records_updated: usize,
    pub records_failed: usize,
    pub status: LoadStatus,
    pub error_message: Option<String>,
    pub load_duration_seconds: f64,
}

impl LoadResult {
    pub fn skipped() -> Self {
        Self {
            records_loaded: 0,
            records_updated: 0,
            records_failed: 0,
            status: LoadStatus::Skipped,
            error_message: None,
            load_duration_seconds: 0.0,
        }
    }

    pub fn failed(message: String, records_failed: usize) -> Self {
        Self {
            records_loaded: 0,
            records_updated: 0,
            records_failed,
            status: LoadStatus::Failed,
            error_message: Some(message),
            load_duration_seconds: 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == LoadStatus::Success
    }
}

/// Read-only aggregate view over everything currently persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub total_records: i64,
    pub unique_cities: i64,
    pub unique_countries: i64,
    pub earliest_data: Option<NaiveDateTime>,
    pub latest_data: Option<NaiveDateTime>,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_quality_score: Option<f64>,
}

impl DataSummary {
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Database Summary ===\n");
        out.push_str(&format!("Total Records: {}\n", self.total_records));
        out.push_str(&format!("Unique Cities: {}\n", self.unique_cities));
        out.push_str(&format!("Unique Countries: {}\n", self.unique_countries));
        if let (Some(min), Some(max)) = (self.earliest_data, self.latest_data) {
            out.push_str(&format!("Data Range: {} to {}\n", min, max));
        }
        if let Some(t) = self.avg_temperature {
            out.push_str(&format!("Average Temperature: {:.2}\u{b0}C\n", t));
        }
        if let Some(h) = self.avg_humidity {
            out.push_str(&format!("Average Humidity: {:.2}%\n", h));
        }
        if let Some(q) = self.avg_quality_score {
            out.push_str(&format!("Average Quality Score: {:.2}/100\n", q));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_zero_retention() {
        let metrics = QualityMetrics::empty(0);
        assert_eq!(metrics.data_retention_rate, 0.0);
        assert_eq!(metrics.total_records_output, 0);
    }

    #[test]
    fn test_load_status_strings() {
        assert_eq!(LoadStatus::Success.as_str(), "success");
        assert_eq!(LoadStatus::Failed.as_str(), "failed");
        assert_eq!(LoadStatus::Skipped.as_str(), "skipped");
    }

    #[test]
    fn test_skipped_result_has_zero_counts() {
        let result = LoadResult::skipped();
        assert_eq!(result.records_loaded, 0);
        assert_eq!(result.records_failed, 0);
        assert_eq!(result.status, LoadStatus::Skipped);
        assert!(result.error_message.is_none());
    }
}
