use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::RawObservation;

/// Read raw observations from a JSON file — the handoff format produced by
/// the ingestion side. An empty array is valid input.
pub fn read_observations(path: &Path) -> Result<Vec<RawObservation>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let observations: Vec<RawObservation> = serde_json::from_reader(reader)?;
    info!(
        records = observations.len(),
        path = %path.display(),
        "read raw observations"
    );
    Ok(observations)
}
