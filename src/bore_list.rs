use std::path::Path;

use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum BoreListError {
    #[error("Failed to read bore list: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse bore list CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Bore list has no 'bore_name' column")]
    MissingColumn,
}

/// Read the `bore_name` column from a local CSV file, in file order.
/// Blank cells are skipped.
pub fn read_bore_names(path: &Path) -> Result<Vec<String>, BoreListError> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = headers
        .iter()
        .position(|h| h.trim() == "bore_name")
        .ok_or(BoreListError::MissingColumn)?;

    let mut bores = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(name) = record.get(column) {
            let name = name.trim();
            if !name.is_empty() {
                bores.push(name.to_string());
            }
        }
    }

    Ok(bores)
}

/// Load the bore list for a run. A missing, empty, or malformed file never
/// fails the process: the condition is reported and an empty list is
/// returned, which makes the run a no-op.
pub fn load_bore_list(path: &Path) -> Vec<String> {
    match read_bore_names(path) {
        Ok(bores) => {
            if bores.is_empty() {
                warn!("Bore list {path:?} contains no bore names");
            } else {
                info!("Loaded {} bores from {path:?}", bores.len());
            }
            bores
        }
        Err(e) => {
            warn!("Could not load bore list {path:?}: {e}");
            Vec::new()
        }
    }
}
