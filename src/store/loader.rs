use std::time::Instant;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::models::{DataSummary, LoadResult, LoadStatus, LoadStrategy, Observation, QualityMetrics};
use crate::store::{connect, DatabaseConfig, ObservationStore};

/// Applies a transformed record set against a relational store and reports
/// granular statistics. Dialect-agnostic: all SQL lives behind the
/// [`ObservationStore`] trait.
///
/// One loader owns one store handle; it is not safe to share an instance
/// across concurrent callers without external synchronization.
pub struct UpsertLoader {
    store: Box<dyn ObservationStore>,
}

impl UpsertLoader {
    pub fn new(store: Box<dyn ObservationStore>) -> Self {
        Self { store }
    }

    /// Connect to the configured database and prepare the schema. A
    /// connection or table-creation failure here is fatal; no load is
    /// attempted against a store without its tables.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let store = connect(config).await?;
        store.ensure_schema().await?;
        Ok(Self::new(store))
    }

    /// Load a record batch under the given strategy.
    ///
    /// An empty batch short-circuits to a skipped result. Under `upsert`,
    /// each row is applied independently: a failed row increments
    /// `records_failed` and the loop continues. Under `insert` and
    /// `replace`, the batch is atomic and any failure fails the whole call.
    /// Failures are reported in the returned [`LoadResult`], not as errors;
    /// every call appends one row to the load-history ledger.
    pub async fn load(&self, records: &[Observation], strategy: LoadStrategy) -> Result<LoadResult> {
        if records.is_empty() {
            warn!("no records to load");
            let result = LoadResult::skipped();
            self.append_history(&result, 0).await;
            return Ok(result);
        }

        info!(
            records = records.len(),
            strategy = strategy.as_str(),
            "starting load"
        );
        let start = Instant::now();

        let mut result = match strategy {
            LoadStrategy::Insert => self.load_atomic(records, false).await,
            LoadStrategy::Replace => self.load_atomic(records, true).await,
            LoadStrategy::Upsert => self.load_upsert(records).await,
        };
        result.load_duration_seconds = start.elapsed().as_secs_f64();

        self.append_history(&result, records.len()).await;

        match result.status {
            LoadStatus::Failed => error!(
                error = result.error_message.as_deref().unwrap_or("unknown"),
                "load failed"
            ),
            _ => info!(
                loaded = result.records_loaded,
                updated = result.records_updated,
                failed = result.records_failed,
                "load completed"
            ),
        }

        Ok(result)
    }

    /// Insert or replace strategies: one transaction, all-or-nothing. A
    /// duplicate-key violation under `insert` therefore fails the entire
    /// call with no partial success.
    async fn load_atomic(&self, records: &[Observation], replace: bool) -> LoadResult {
        let outcome = if replace {
            self.store.replace_all(records).await
        } else {
            self.store.insert_all(records).await
        };

        match outcome {
            Ok(count) => LoadResult {
                records_loaded: count as usize,
                records_updated: 0,
                records_failed: 0,
                status: LoadStatus::Success,
                error_message: None,
                load_duration_seconds: 0.0,
            },
            Err(e) => LoadResult::failed(e.to_string(), records.len()),
        }
    }

    /// Per-row conflict-resolving path. Rows are independent: one failure
    /// never aborts the remainder.
    async fn load_upsert(&self, records: &[Observation]) -> LoadResult {
        let mut loaded = 0usize;
        let mut failed = 0usize;

        for record in records {
            match self.store.upsert(record).await {
                Ok(()) => loaded += 1,
                Err(e) => {
                    warn!(
                        city = %record.city,
                        country = %record.country,
                        error = %e,
                        "failed to upsert record"
                    );
                    failed += 1;
                }
            }
        }

        LoadResult {
            records_loaded: loaded,
            // Stores are not asked to distinguish insert from update; see
            // DESIGN.md.
            records_updated: 0,
            records_failed: failed,
            status: LoadStatus::Success,
            error_message: None,
            load_duration_seconds: 0.0,
        }
    }

    /// Persist one quality-metrics snapshot; append-only.
    pub async fn load_quality_metrics(&self, metrics: &QualityMetrics) -> Result<()> {
        self.store.record_quality_metrics(metrics).await?;
        info!("quality metrics persisted");
        Ok(())
    }

    /// Aggregate statistics over everything currently persisted.
    pub async fn get_data_summary(&self) -> Result<DataSummary> {
        self.store.data_summary().await
    }

    async fn append_history(&self, result: &LoadResult, total_records: usize) {
        let source_info = format!("Total records: {}", total_records);
        if let Err(e) = self.store.append_load_history(result, &source_info).await {
            warn!(error = %e, "failed to append load history");
        }
    }
}
