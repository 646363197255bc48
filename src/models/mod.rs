pub mod metrics;
pub mod observation;

pub use metrics::{DataSummary, LoadResult, LoadStatus, LoadStrategy, QualityMetrics};
pub use observation::{
    Enrichment, HumidityCategory, Observation, RawObservation, Season, TempCategory, WindCategory,
};
