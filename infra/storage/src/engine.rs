//! Write-once image store confined to a single root directory.
//!
//! [`Storage`] owns the on-disk hierarchy: it mints object identifiers, publishes new files
//! without ever overwriting an existing one, deletes single files or whole character subtrees
//! and prunes directories that deletions leave empty.

use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::object_id::{ObjectId, ObjectIdGenerator};
use crate::security;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Extension used for stored files unless the builder sets another one.
pub const DEFAULT_EXTENSION: &str = "webp";

/// A freshly published file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Absolute location on disk.
    pub path: PathBuf,
    /// Location relative to the storage root, `/`-separated.
    pub relative: String,
}

/// The internal shared state of a [`Storage`] instance.
#[derive(Debug)]
pub struct StorageInner {
    /// The canonicalized physical path on the disk where all data is stored.
    pub(crate) root: PathBuf,
    /// File extension appended to every generated object name.
    pub(crate) extension: String,
    pub(crate) ids: ObjectIdGenerator,
    /// A unique counter used to generate temporary file names.
    pub(crate) tmp_counter: AtomicU64,
}

/// A thread-safe handle to the image store.
///
/// This handle is internally reference-counted (`Arc`) and can be cheaply cloned
/// across threads or tasks.
///
/// # Example
///
/// ```rust
/// use fc_storage::{Storage, StorageError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     # let root = tmp.path().join("images");
///     let storage = Storage::builder().root(&root).create(true).connect().await?;
///
///     let stored = storage.put(b"RIFF....WEBP", &["507f1f77bcf86cd799439011"]).await?;
///     assert!(stored.relative.starts_with("507f1f77bcf86cd799439011/"));
///     assert!(stored.relative.ends_with(".webp"));
///
///     storage.delete_subtree(&["507f1f77bcf86cd799439011"]).await?;
///     assert!(!stored.path.exists());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use = "The storage engine is not initialized until you call .connect()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// Canonical storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolves segments against the storage root. See [`crate::resolve`].
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<PathBuf, StorageError> {
        security::resolve(&self.root, segment_strs(segments))
    }

    /// Returns whether anything (file or directory) exists at the resolved location.
    pub fn exists<S: AsRef<str>>(&self, segments: &[S]) -> Result<bool, StorageError> {
        let resolved = self.resolve(segments)?;
        resolved.try_exists().context(format!("Failed to stat {}", resolved.display()))
    }

    /// Stores `data` under `segments` with a freshly generated identifier as file name.
    ///
    /// The last segment is the identity key and must be a valid [`ObjectId`]. The file lands at
    /// `<root>/<segments...>/<id>.<ext>` and is never overwritten.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidIdentifier`] if the last segment is missing or not an id.
    /// - [`StorageError::PathTraversalAttempt`] if the target leaves the root.
    /// - [`StorageError::AlreadyExists`] if something already occupies the target.
    /// - [`StorageError::Io`] on filesystem failures.
    pub async fn put<S: AsRef<str>>(
        &self,
        data: &[u8],
        segments: &[S],
    ) -> Result<StoredObject, StorageError> {
        let id = self.ids.generate();
        self.put_with_id(id, data, segments).await
    }

    /// Same as [`Storage::put`] with a caller-chosen identifier.
    pub async fn put_with_id<S: AsRef<str>>(
        &self,
        id: ObjectId,
        data: &[u8],
        segments: &[S],
    ) -> Result<StoredObject, StorageError> {
        validate_identity(segments)?;

        let file_name = format!("{id}.{}", self.extension);
        let target = security::resolve(
            &self.root,
            segment_strs(segments).chain(std::iter::once(file_name.as_str())),
        )?;

        if fs::try_exists(&target).await.context("Failed to check target")? {
            return Err(StorageError::AlreadyExists {
                message: target.display().to_string().into(),
                context: None,
            });
        }

        let parent = target.parent().ok_or_else(|| StorageError::Internal {
            message: target.display().to_string().into(),
            context: Some("Target has no parent directory".into()),
        })?;

        create_dirs(parent).await?;
        #[cfg(test)]
        hooks::run(&hooks::AFTER_CREATE_DIRS, parent);
        let temp = match self.write_temp(&target, data).await {
            Err(StorageError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                // A concurrent prune removed the fresh directory.
                create_dirs(parent).await?;
                self.write_temp(&target, data).await?
            },
            other => other?,
        };

        let published = fs::hard_link(&temp, &target).await;
        if let Err(e) = fs::remove_file(&temp).await {
            warn!(path = %temp.display(), error = %e, "Failed to remove temp file");
        }
        match published {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists {
                    message: target.display().to_string().into(),
                    context: Some("Target appeared during write".into()),
                });
            },
            Err(e) => {
                return Err(StorageError::Io {
                    source: e,
                    context: Some(format!("Failed to publish {}", target.display()).into()),
                });
            },
        }

        Self::sync_dir(parent).await;

        let relative = self.relative(&target);
        debug!(path = %target.display(), bytes = data.len(), "Object stored");
        Ok(StoredObject { path: target, relative })
    }

    /// Deletes exactly one file and prunes directories left empty.
    ///
    /// Returns the deleted location relative to the root. Prune failures are logged only.
    ///
    /// # Errors
    ///
    /// - [`StorageError::PathTraversalAttempt`] if the target leaves the root.
    /// - [`StorageError::NotFound`] if nothing exists at the target.
    /// - [`StorageError::IsDirectory`] if the target is a directory.
    pub async fn delete_one<S: AsRef<str>>(&self, segments: &[S]) -> Result<String, StorageError> {
        let target = self.resolve(segments)?;
        let relative = self.relative(&target);

        let meta = match fs::symlink_metadata(&target).await {
            Ok(meta) => meta,
            Err(e) if is_missing(&e) => {
                return Err(StorageError::NotFound { message: relative.into(), context: None });
            },
            Err(e) => {
                return Err(StorageError::Io {
                    source: e,
                    context: Some(format!("Failed to stat {}", target.display()).into()),
                });
            },
        };
        if meta.is_dir() {
            return Err(StorageError::IsDirectory { message: relative.into(), context: None });
        }

        remove_missing_as_not_found(fs::remove_file(&target).await, &relative)?;

        info!(path = %relative, "Deleted image");
        self.prune_after_delete().await;
        Ok(relative)
    }

    /// Deletes everything stored under a character and prunes directories left empty.
    ///
    /// The last segment must be a valid [`ObjectId`]. A file at that location is removed as
    /// well as a directory tree.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidIdentifier`] if the last segment is missing or not an id.
    /// - [`StorageError::PathTraversalAttempt`] if the target leaves the root.
    /// - [`StorageError::NotFound`] if nothing exists at the target.
    pub async fn delete_subtree<S: AsRef<str>>(
        &self,
        segments: &[S],
    ) -> Result<String, StorageError> {
        validate_identity(segments)?;
        let target = self.resolve(segments)?;
        let relative = self.relative(&target);

        let meta = match fs::symlink_metadata(&target).await {
            Ok(meta) => meta,
            Err(e) if is_missing(&e) => {
                return Err(StorageError::NotFound { message: relative.into(), context: None });
            },
            Err(e) => {
                return Err(StorageError::Io {
                    source: e,
                    context: Some(format!("Failed to stat {}", target.display()).into()),
                });
            },
        };

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&target).await
        } else {
            fs::remove_file(&target).await
        };
        remove_missing_as_not_found(removed, &relative)?;

        info!(path = %relative, "Deleted character subtree");
        self.prune_after_delete().await;
        Ok(relative)
    }

    /// Removes every empty directory below the root. Returns how many were removed.
    pub async fn prune(&self) -> Result<usize, StorageError> {
        maintenance::prune_empty_dirs(&self.root).await
    }

    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.root).await;
    }

    async fn prune_after_delete(&self) {
        #[cfg(test)]
        hooks::run(&hooks::BEFORE_PRUNE, &self.root);
        match self.prune().await {
            Ok(0) => {},
            Ok(removed) => debug!(removed, "Pruned empty directories"),
            Err(e) => warn!(error = %e, "Failed to prune empty directories"),
        }
    }

    async fn write_temp(&self, target: &Path, data: &[u8]) -> Result<PathBuf, StorageError> {
        let temp = unique_tmp_path(target, &self.tmp_counter);

        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp)
            .await
            .context(format!("Temp creation failed: {}", temp.display()))?;

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&temp).await {
                warn!(path = %temp.display(), error = %cleanup, "Failed to remove temp file");
            }
            return Err(StorageError::Io {
                source: e,
                context: Some(format!("Write failed: {}", temp.display()).into()),
            });
        }

        Ok(temp)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    async fn sync_dir(path: &Path) {
        match fs::File::open(path).await {
            Ok(dir) => {
                if let Err(err) = dir.sync_all().await {
                    warn!(path = %path.display(), error = %err, "Directory sync failed");
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Directory open failed");
            },
        }
    }
}

fn validate_identity<S: AsRef<str>>(segments: &[S]) -> Result<(), StorageError> {
    match segment_strs(segments).last() {
        Some(id) if ObjectId::is_valid(id) => Ok(()),
        Some(id) => Err(StorageError::InvalidIdentifier {
            message: format!("{id} is not a valid character ID").into(),
            context: None,
        }),
        None => Err(StorageError::InvalidIdentifier {
            message: "missing character ID".into(),
            context: None,
        }),
    }
}

fn segment_strs<S: AsRef<str>>(segments: &[S]) -> impl Iterator<Item = &str> {
    segments.iter().map(AsRef::as_ref)
}

/// A file standing where a directory is expected (`ENOTDIR`) also means nothing is there.
fn is_missing(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Concurrent deletes race at the OS level; the loser reports `NotFound`.
fn remove_missing_as_not_found(
    result: std::io::Result<()>,
    relative: &str,
) -> Result<(), StorageError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if is_missing(&e) => Err(StorageError::NotFound {
            message: relative.to_owned().into(),
            context: Some("Removed concurrently".into()),
        }),
        Err(e) => Err(StorageError::Io {
            source: e,
            context: Some(format!("Failed to delete {relative}").into()),
        }),
    }
}

#[cfg(unix)]
async fn create_dirs(path: &Path) -> Result<(), StorageError> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(path)
        .await
        .context(format!("Failed to create directories for {}", path.display()))
}

#[cfg(not(unix))]
async fn create_dirs(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path)
        .await
        .context(format!("Failed to create directories for {}", path.display()))
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("object");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{counter}"))
}
