use crate::error::{StorageError, StorageErrorExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};
use walkdir::{DirEntry, WalkDir};

/// Marker embedded in the names of in-flight temp files.
pub(crate) const TMP_MARKER: &str = ".fctmp.";

const STALE_THRESHOLD: Duration = Duration::from_secs(300);

/// Removes every empty directory strictly below `base`, deepest first.
///
/// Each directory is listed again after its children were handled, so a parent emptied during
/// the walk is removed in the same pass. Files are never removed, symlinks are never followed
/// and `base` itself always survives. Running it twice is the same as running it once.
///
/// # Errors
///
/// Aborts with [`StorageError::Io`] on the first listing or removal failure. Directories
/// removed before the failure stay removed.
pub async fn prune_empty_dirs(base: impl Into<PathBuf>) -> Result<usize, StorageError> {
    let base = base.into();

    tokio::task::spawn_blocking(move || prune_blocking(&base))
        .await
        .map_err(|e| StorageError::Internal {
            message: e.to_string().into(),
            context: Some("Prune task panicked".into()),
        })?
}

fn prune_blocking(base: &Path) -> Result<usize, StorageError> {
    let mut removed = 0;

    for entry in WalkDir::new(base).min_depth(1).follow_links(false).contents_first(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| base.to_path_buf());
            StorageError::Io {
                source: e.into(),
                context: Some(format!("Failed to list {}", path.display()).into()),
            }
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let is_empty = std::fs::read_dir(path)
            .context(format!("Failed to list {}", path.display()))?
            .next()
            .is_none();

        if is_empty {
            std::fs::remove_dir(path)
                .context(format!("Failed to remove empty directory {}", path.display()))?;
            debug!(path = %path.display(), "Pruned empty directory");
            removed += 1;
        }
    }

    Ok(removed)
}

/// Deletes temp files older than five minutes left behind by interrupted writes.
pub(crate) async fn purge_tmp(root: &Path) {
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || remove_stale(&root, now, STALE_THRESHOLD)).await {
        Ok((removed, failed)) if removed > 0 || failed > 0 => {
            info!(removed, failed, "Cleaned up temporary files");
        },
        Err(e) => {
            error!(error = %e, "Temp file cleanup task panicked");
        },
        _ => {},
    }
}

fn remove_stale(root: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .flatten()
        .filter(|entry| is_tmp(entry) && is_stale(entry, now, threshold))
        .for_each(|entry| match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Failed to remove temp file");
                failed += 1;
            },
        });

    (removed, failed)
}

fn is_tmp(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER))
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age > threshold)
}
