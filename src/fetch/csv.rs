// src/fetch/csv.rs

use anyhow::{Context, Result};
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use std::io::Cursor;
use std::sync::Arc;

/// Decode the zone lookup CSV into a single record batch.
///
/// The lookup carries no declared typing; its schema is inferred from the
/// full payload, header row included.
pub fn decode_zones(data: &Bytes) -> Result<RecordBatch> {
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(Cursor::new(data.as_ref()), None)
        .context("inferring zone lookup schema")?;
    let schema = Arc::new(schema);

    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(Cursor::new(data.as_ref()))
        .context("creating zone lookup reader")?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("decoding zone lookup rows")?;
    concat_batches(&schema, &batches).context("concatenating zone lookup batches")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::DataType;

    static SAMPLE: &str = "\
LocationID,Borough,Zone,service_zone
1,EWR,Newark Airport,EWR
2,Queens,Jamaica Bay,Boro Zone
3,Bronx,Allerton/Pelham Gardens,Boro Zone
";

    #[test]
    fn decodes_zone_lookup_with_inferred_schema() -> Result<()> {
        let batch = decode_zones(&Bytes::from_static(SAMPLE.as_bytes()))?;

        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 4);
        assert_eq!(
            batch.schema().field(0).data_type(),
            &DataType::Int64,
            "LocationID should infer as an integer"
        );

        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!((ids.value(0), ids.value(1), ids.value(2)), (1, 2, 3));

        let boroughs = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(boroughs.value(2), "Bronx");
        Ok(())
    }

    #[test]
    fn rejects_malformed_payload() {
        // second record is truncated to a single field
        let garbage = Bytes::from_static(b"LocationID,Borough\n1,EWR\n2\n");
        assert!(decode_zones(&garbage).is_err());
    }
}
