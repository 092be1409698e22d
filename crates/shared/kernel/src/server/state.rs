use axum::extract::FromRef;
use fc_domain::config::ApiConfig;
use fc_ingest::{IngestError, Ingestor, Quality};
use fc_storage::Storage;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[fc_derive::fc_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("State ingestion setup error{}: {source}", format_context(.context))]
    Ingest { source: IngestError, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub storage: Storage,
    pub ingestor: Ingestor,
    pub quality: Quality,
}

#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for Storage {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.storage.clone()
    }
}

impl FromRef<ApiState> for Ingestor {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.ingestor.clone()
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    storage: Option<Storage>,
    ingestor: Option<Ingestor>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Overrides the ingestor built from the storage by default.
    #[must_use]
    pub fn ingestor(mut self, ingestor: Ingestor) -> Self {
        self.ingestor = Some(ingestor);
        self
    }

    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "ApiConfig not provided".into(),
            context: None,
        })?;
        let storage = self.storage.ok_or_else(|| ApiStateError::Validation {
            message: "Storage not provided".into(),
            context: None,
        })?;
        let ingestor = match self.ingestor {
            Some(ingestor) => ingestor,
            None => Ingestor::new(storage.clone()).context("Failed to build ingestor")?,
        };
        let quality = Quality::new(config.storage.quality).context("storage.quality")?;

        super::health::mark_start();

        Ok(ApiState { inner: Arc::new(ApiStateInner { config, storage, ingestor, quality }) })
    }
}
