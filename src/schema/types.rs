// src/schema/types.rs

use arrow::datatypes::{DataType, TimeUnit};

/// Semantic column types the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    /// Nullable 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// UTF-8 string.
    Text,
    /// Microsecond timestamp without timezone.
    Timestamp,
}

impl SemanticType {
    /// The Arrow type every column of this semantic type is cast to after
    /// fetch, before any database write.
    pub fn to_arrow(self) -> DataType {
        match self {
            SemanticType::Int => DataType::Int64,
            SemanticType::Float => DataType::Float64,
            SemanticType::Text => DataType::Utf8,
            SemanticType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }
}
