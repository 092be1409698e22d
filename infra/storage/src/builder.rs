use crate::engine::{DEFAULT_EXTENSION, Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use crate::object_id::ObjectIdGenerator;
use private::Sealed;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct StorageConfig {
    extension: Cow<'static, str>,
    create: bool,
    prune_on_connect: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { extension: Cow::Borrowed(DEFAULT_EXTENSION), create: false, prune_on_connect: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct StorageBuilder<S: Sealed = NoRoot> {
    state: S,
    config: StorageConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> StorageBuilder<S> {
    #[must_use = "Sets whether the root directory should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    /// Extension of stored files, without the leading dot. Defaults to `webp`.
    #[must_use = "Sets the file extension of stored objects"]
    pub fn extension(mut self, extension: impl Into<Cow<'static, str>>) -> Self {
        self.config.extension = extension.into();
        self
    }

    #[must_use = "Sets whether empty directories are pruned while connecting"]
    pub const fn prune_on_connect(mut self, enable: bool) -> Self {
        self.config.prune_on_connect = enable;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> StorageBuilder<N> {
        StorageBuilder { state, config: self.config }
    }
}

impl StorageBuilder<NoRoot> {
    #[must_use = "Creates a new storage builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory path for the storage engine"]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl StorageBuilder<WithRoot> {
    /// Consumes the configuration and initializes the store.
    ///
    /// Boot sequence:
    /// 1. **Bootstrapping**: Creates the root directory if `create(true)` was set.
    /// 2. **Canonicalization**: Resolves the root to its physical path once, so every later
    ///    confinement check compares against the real location.
    /// 3. **Identifiers**: Seeds the object id generator from the OS RNG.
    /// 4. **Self-Healing**: Removes stale temp files left by interrupted writes, then prunes
    ///    empty directories. Both steps only log their failures.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the root is missing (and `create` is false), is not a
    /// directory, or cannot be resolved. Returns [`StorageError::InvalidIdentifier`] for an
    /// empty or dotted extension and [`StorageError::Internal`] if the RNG is unavailable.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let root = &self.state.0;
        let extension = self.config.extension;

        if extension.is_empty() || extension.contains(['.', '/', '\\']) {
            return Err(StorageError::InvalidIdentifier {
                message: format!("invalid file extension {extension:?}").into(),
                context: None,
            });
        }

        if self.config.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
            info!(path = %root.display(), "Bootstrapped storage root directory");
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;

        let meta = fs::metadata(&canonical).await.context("Failed to inspect storage root")?;
        if !meta.is_dir() {
            return Err(StorageError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
                context: Some(format!("Storage root {}", canonical.display()).into()),
            });
        }

        let storage = Storage {
            inner: Arc::new(StorageInner {
                root: canonical,
                extension: extension.into_owned(),
                ids: ObjectIdGenerator::new()?,
                tmp_counter: AtomicU64::new(1),
            }),
        };

        storage.purge_tmp().await;

        if self.config.prune_on_connect {
            match storage.prune().await {
                Ok(0) => {},
                Ok(removed) => info!(removed, "Pruned empty directories at startup"),
                Err(e) => warn!(error = %e, "Startup prune failed"),
            }
        }

        info!(path = %storage.root().display(), "Image store ready");
        Ok(storage)
    }
}
