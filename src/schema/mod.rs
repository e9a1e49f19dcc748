// src/schema/mod.rs

pub mod types;

use anyhow::{bail, Context, Result};
use arrow::compute::cast;
use arrow::datatypes::{Field, Schema as ArrowSchema, SchemaRef};
use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

pub use types::SemanticType;

/// Declared column types for the trip table. The column set of the fetched
/// parquet file must match this mapping exactly; a mismatch is fatal at
/// fetch time, never a per-row error.
pub static TRIP_COLUMNS: &[(&str, SemanticType)] = &[
    ("VendorID", SemanticType::Int),
    ("passenger_count", SemanticType::Int),
    ("trip_distance", SemanticType::Float),
    ("RatecodeID", SemanticType::Int),
    ("store_and_fwd_flag", SemanticType::Text),
    ("PULocationID", SemanticType::Int),
    ("DOLocationID", SemanticType::Int),
    ("payment_type", SemanticType::Int),
    ("fare_amount", SemanticType::Float),
    ("extra", SemanticType::Float),
    ("mta_tax", SemanticType::Float),
    ("tip_amount", SemanticType::Float),
    ("tolls_amount", SemanticType::Float),
    ("improvement_surcharge", SemanticType::Float),
    ("total_amount", SemanticType::Float),
    ("congestion_surcharge", SemanticType::Float),
    ("tpep_pickup_datetime", SemanticType::Timestamp),
    ("tpep_dropoff_datetime", SemanticType::Timestamp),
];

/// The declared trip schema as Arrow, in declaration order. All columns
/// are nullable.
pub static TRIP_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    let fields: Vec<Field> = TRIP_COLUMNS
        .iter()
        .map(|(name, ty)| Field::new(*name, ty.to_arrow(), true))
        .collect();
    Arc::new(ArrowSchema::new(fields))
});

/// Validate `batch` against the declared trip mapping and cast every
/// column to its declared Arrow type.
///
/// The fetched column SET must equal the declaration exactly; missing and
/// unexpected columns are both fatal and reported by name. Column order
/// follows the fetched file.
pub fn conform(batch: &RecordBatch) -> Result<RecordBatch> {
    let declared: HashMap<&str, SemanticType> = TRIP_COLUMNS.iter().copied().collect();
    let fetched = batch.schema();

    let missing: Vec<&str> = TRIP_COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| fetched.field_with_name(*name).is_err())
        .collect();
    let unexpected: Vec<&str> = fetched
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .filter(|name| !declared.contains_key(name))
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        bail!(
            "trip columns do not match the declared mapping (missing: [{}], unexpected: [{}])",
            missing.join(", "),
            unexpected.join(", ")
        );
    }

    let mut fields = Vec::with_capacity(fetched.fields().len());
    let mut columns = Vec::with_capacity(fetched.fields().len());
    for (idx, field) in fetched.fields().iter().enumerate() {
        let target = declared[field.name().as_str()].to_arrow();
        let column = cast(batch.column(idx), &target)
            .with_context(|| format!("casting column {} to {}", field.name(), target))?;
        fields.push(Field::new(field.name().as_str(), target, true));
        columns.push(column);
    }

    let schema = Arc::new(ArrowSchema::new(fields));
    RecordBatch::try_new(schema, columns).context("rebuilding conformed trip batch")
}
