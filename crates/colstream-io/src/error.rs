use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] colstream_core::error::Error),

    /// Codec tag or schema descriptor could not be decoded.
    #[error("malformed stream header: {0}")]
    MalformedHeader(String),

    #[error("unknown codec tag: {0:#04x}")]
    UnknownCodecTag(u8),

    /// A block codec failed mid-decode.
    #[error("malformed block body at byte {position}: {reason}")]
    MalformedBody { position: u64, reason: String },

    /// `finish` was called before any block bound a codec.
    #[error("stream writer finished before any block was appended")]
    Unbound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Map an I/O error hit while decoding the header. A short read means
    /// the stream is truncated, not that the device failed.
    pub(crate) fn header(e: std::io::Error, what: &str) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::MalformedHeader(format!("truncated {what}"))
        } else {
            Error::Io(e)
        }
    }

    pub(crate) fn body(position: u64, reason: impl Into<String>) -> Self {
        Error::MalformedBody {
            position,
            reason: reason.into(),
        }
    }

    /// True for data errors (corrupt or truncated stream) as opposed to
    /// device failures or usage errors.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::MalformedHeader(_) | Error::UnknownCodecTag(_) | Error::MalformedBody { .. }
        )
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        let ctx = context.into();
        match self {
            Error::MalformedHeader(msg) => Error::MalformedHeader(format!("{ctx}: {msg}")),
            Error::MalformedBody { position, reason } => Error::MalformedBody {
                position,
                reason: format!("{ctx}: {reason}"),
            },
            Error::InvalidArgument(msg) => Error::InvalidArgument(format!("{ctx}: {msg}")),
            Error::Core(e) => Error::Core(e.with_context(ctx)),
            other => other,
        }
    }
}
