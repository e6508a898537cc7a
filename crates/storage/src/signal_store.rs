use std::path::{Path, PathBuf};
use std::time::SystemTime;

use common::models::RawSignal;
use tokio::fs;
use tracing::{debug, info};

use crate::StorageError;

/// Newest `*.json` file in `dir` by modification time, decoded as a signal.
pub async fn load_latest_signal(dir: &Path) -> Result<(PathBuf, RawSignal), StorageError> {
    let path = newest_json(dir).await?;
    let bytes = fs::read(&path)
        .await
        .map_err(|e| StorageError::io(&path, e))?;

    let signal = serde_json::from_slice::<RawSignal>(&bytes).map_err(|source| {
        StorageError::Json {
            path: path.clone(),
            source,
        }
    })?;

    info!("Loaded signal file {}", path.display());
    Ok((path, signal))
}

async fn newest_json(dir: &Path) -> Result<PathBuf, StorageError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| StorageError::io(dir, e))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let metadata = entry
            .metadata()
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map_err(|e| StorageError::io(&path, e))?;

        debug!("Candidate signal file {}", path.display());
        if newest.as_ref().is_none_or(|(seen, _)| modified > *seen) {
            newest = Some((modified, path));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| StorageError::NoSignals(dir.to_path_buf()))
}
