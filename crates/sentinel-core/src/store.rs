use crate::dataset::{Dataset, DatasetError, Orientation};
use std::path::Path;
use tracing::{debug, warn};

/// Loads the history stored at `path`.
///
/// A missing file means no history yet. An unreadable or undecodable file is logged and also
/// treated as no history, so the fresh run replaces it.
pub fn load_history(path: &Path, orientation: Orientation) -> Option<Dataset> {
    if !path.exists() {
        debug!(?path, "no persisted dataset");
        return None;
    }
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(?path, %err, "cannot read persisted dataset; starting fresh");
            return None;
        }
    };
    match Dataset::from_json(&text, orientation) {
        Ok(ds) => Some(ds),
        Err(err) => {
            warn!(?path, %err, "persisted dataset is corrupt; starting fresh");
            None
        }
    }
}

pub fn save(path: &Path, dataset: &Dataset) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = dataset.to_json_pretty()?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn merge_into(path: &Path, fresh: Dataset) -> Result<Dataset, DatasetError> {
    let history = load_history(path, fresh.orientation);
    let merged = crate::merge::merge(fresh, history);
    save(path, &merged)?;
    Ok(merged)
}
