pub use crate::block::{BlockEncoding, ColumnBlock, EncodingKind};
pub use crate::config::StreamConfig;
pub use crate::error::{Error, Result};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Scalar, Tuple};
