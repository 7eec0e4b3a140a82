use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),

    /// Error with context chain for better debugging
    #[error("Error in {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Add context to an error, creating an error chain.
    ///
    /// # Example
    /// ```rust,no_run
    /// use colstream_core::error::Error;
    /// let err = Error::Schema("value does not match field 'id'".into());
    /// let err = err.with_context("while building block");
    /// ```
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self) as Box<dyn std::error::Error + Send + Sync>,
        }
    }

    /// Get suggestions for common errors.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::Schema(msg) => {
                if msg.contains("field") || msg.contains("arity") {
                    vec![
                        "Check that every tuple has one value per schema field".into(),
                        "Verify value types match the field data types".into(),
                    ]
                } else {
                    vec![]
                }
            }
            Error::Config(msg) => {
                if msg.contains("block_rows") || msg.contains("buffer") {
                    vec![
                        "Sizes in the stream configuration must be greater than zero".into(),
                        "Check COLSTREAM_* environment overrides".into(),
                    ]
                } else if msg.contains("encoding") {
                    vec!["Supported encodings: uncompressed, rle, dictionary".into()]
                } else {
                    vec![]
                }
            }
            Error::Context { source, .. } => source
                .downcast_ref::<Error>()
                .map(Error::suggestions)
                .unwrap_or_default(),
            _ => vec![],
        }
    }
}
