use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeafError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl LeafError {
    /// Wrap an I/O error with the operation that produced it.
    pub fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| LeafError::Io { context, source }
    }

    /// Wrap a JSON error with the operation that produced it.
    pub fn json(context: impl Into<String>) -> impl FnOnce(serde_json::Error) -> Self {
        let context = context.into();
        move |source| LeafError::Json { context, source }
    }

    /// True when the underlying I/O error is `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LeafError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T, E = LeafError> = std::result::Result<T, E>;
