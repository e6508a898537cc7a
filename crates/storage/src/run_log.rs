use std::path::Path;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::StorageError;

/// Appends one summary block to the run log, creating the file and its
/// parent directory on first use. Blocks are separated by a blank line.
pub async fn append_run_log(path: &Path, message: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;

    let mut block = message.trim_end().to_string();
    block.push_str("\n\n");
    file.write_all(block.as_bytes())
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.flush().await.map_err(|e| StorageError::io(path, e))
}
