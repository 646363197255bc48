pub mod export;

pub use export::{ExportFormat, RecordExporter};
