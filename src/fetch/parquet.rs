// src/fetch/parquet.rs

use anyhow::{Context, Result};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::schema;

/// Decode the trip parquet payload into one fully materialized batch with
/// the declared column mapping applied.
///
/// All row groups are read and concatenated before any chunking happens;
/// memory footprint tracks the remote file, not the chunk size.
pub fn decode_trips(data: Bytes) -> Result<RecordBatch> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(data).context("opening trip parquet payload")?;
    let file_schema = builder.schema().clone();
    let reader = builder.build().context("creating trip parquet reader")?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("decoding trip record batches")?;
    let batch = concat_batches(&file_schema, &batches).context("concatenating trip batches")?;

    schema::conform(&batch)
}
