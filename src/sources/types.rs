// src/sources/types.rs
use chrono::DateTime;
use chrono_tz::Tz;

/// Outcome of one source fetch: either a display value or a human-readable error.
/// Exactly one of the two exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceResult {
    Value(String),
    Error(String),
}

impl SourceResult {
    pub fn value(&self) -> Option<&str> {
        match self {
            SourceResult::Value(v) => Some(v),
            SourceResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SourceResult::Value(_) => None,
            SourceResult::Error(e) => Some(e),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SourceResult::Value(_))
    }
}

impl From<Result<String, FetchError>> for SourceResult {
    fn from(r: Result<String, FetchError>) -> Self {
        match r {
            Ok(v) => SourceResult::Value(v),
            Err(e) => SourceResult::Error(e.to_string()),
        }
    }
}

impl From<FetchError> for SourceResult {
    fn from(e: FetchError) -> Self {
        SourceResult::Error(e.to_string())
    }
}

/// Everything that can go wrong while fetching one source.
/// Display strings are the user-facing error texts.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Error de red: {0}")]
    Network(String),
    #[error("Error de red: respuesta HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Missing(String),
    #[error("Error procesando datos: {0}")]
    Parse(String),
    #[error("Tiempo de espera agotado ({0}s)")]
    Timeout(u64),
    #[error("Fallo interno al obtener el dato")]
    Panicked,
}

impl FetchError {
    /// Short machine label for logs/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Status(_) => "status",
            FetchError::Missing(_) => "missing",
            FetchError::Parse(_) => "parse",
            FetchError::Timeout(_) => "timeout",
            FetchError::Panicked => "panicked",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Network(e.to_string()),
        }
    }
}

/// Per-request inputs shared by every adapter call.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Wall-clock time in the reference market timezone.
    pub now: DateTime<Tz>,
}

/// One upstream data point. Implementations perform at most one network call
/// and never panic on upstream garbage; every failure is a `FetchError`.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, ctx: &FetchContext) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}

/// Returns a canned result. Used for offline configs and tests.
#[derive(Debug, Clone)]
pub struct FixedAdapter {
    value: Option<String>,
    error: Option<String>,
}

impl FixedAdapter {
    pub fn value(v: impl Into<String>) -> Self {
        Self {
            value: Some(v.into()),
            error: None,
        }
    }

    pub fn error(e: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl SourceAdapter for FixedAdapter {
    async fn fetch(&self, _ctx: &FetchContext) -> Result<String, FetchError> {
        match (&self.value, &self.error) {
            (Some(v), _) => Ok(v.clone()),
            (None, Some(e)) => Err(FetchError::Missing(e.clone())),
            (None, None) => Err(FetchError::Missing("Sin datos".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
