// src/pg/mod.rs

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime};
use futures::pin_mut;
use tokio_postgres::binary_copy::BinaryCopyInWriter;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, CopyInSink, NoTls};
use tracing::error;

/// Connect and hand the connection driver to the runtime. The connection
/// is not probed beyond the handshake; a bad target surfaces on first use.
pub async fn connect(conn_str: &str) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
        .await
        .context("connecting to Postgres")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("postgres connection error: {}", e);
        }
    });

    Ok(client)
}

/// SQL type name and wire type for an Arrow column type. Anything outside
/// this mapping is fatal for the whole load.
fn pg_type(dt: &DataType) -> Result<(&'static str, Type)> {
    Ok(match dt {
        DataType::Int16 => ("SMALLINT", Type::INT2),
        DataType::Int32 => ("INTEGER", Type::INT4),
        DataType::Int64 => ("BIGINT", Type::INT8),
        DataType::Float32 => ("REAL", Type::FLOAT4),
        DataType::Float64 => ("DOUBLE PRECISION", Type::FLOAT8),
        DataType::Utf8 | DataType::LargeUtf8 => ("TEXT", Type::TEXT),
        DataType::Boolean => ("BOOLEAN", Type::BOOL),
        DataType::Timestamp(TimeUnit::Microsecond, None) => ("TIMESTAMP", Type::TIMESTAMP),
        other => bail!("unsupported column type {} for Postgres load", other),
    })
}

/// Quote an identifier. Trip columns are mixed-case, so every table and
/// column name goes through here.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// CREATE TABLE statement for `table` from an Arrow schema. Every column
/// is nullable, no constraints.
pub fn create_table_sql(table: &str, schema: &SchemaRef) -> Result<String> {
    let columns = schema
        .fields()
        .iter()
        .map(|f| {
            let (sql, _) = pg_type(f.data_type())
                .with_context(|| format!("column {}", f.name()))?;
            Ok(format!("{} {}", quote_ident(f.name()), sql))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_ident(table),
        columns.join(", ")
    ))
}

/// COPY statement matching [`append_batch`]'s binary stream.
pub fn copy_statement(table: &str, schema: &SchemaRef) -> String {
    let columns = schema
        .fields()
        .iter()
        .map(|f| quote_ident(f.name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM STDIN BINARY",
        quote_ident(table),
        columns
    )
}

/// Drop-and-recreate `table` with the given schema. Replace semantics:
/// whatever existed under the name is gone afterwards.
pub async fn replace_table(client: &Client, table: &str, schema: &SchemaRef) -> Result<()> {
    let ddl = format!(
        "DROP TABLE IF EXISTS {}; {}",
        quote_ident(table),
        create_table_sql(table, schema)?
    );
    client
        .batch_execute(&ddl)
        .await
        .with_context(|| format!("recreating table {}", table))
}

/// Append every row of `batch` to `table` as one binary COPY. Returns the
/// row count reported by the server.
pub async fn append_batch(client: &Client, table: &str, batch: &RecordBatch) -> Result<u64> {
    let schema = batch.schema();
    let types = schema
        .fields()
        .iter()
        .map(|f| {
            pg_type(f.data_type())
                .map(|(_, t)| t)
                .with_context(|| format!("column {}", f.name()))
        })
        .collect::<Result<Vec<_>>>()?;

    let stmt = copy_statement(table, &schema);
    let sink: CopyInSink<Bytes> = client
        .copy_in(stmt.as_str())
        .await
        .with_context(|| format!("starting COPY into {}", table))?;
    let writer = BinaryCopyInWriter::new(sink, &types);
    pin_mut!(writer);

    for row in 0..batch.num_rows() {
        let values = row_values(batch, row)?;
        let refs: Vec<&(dyn ToSql + Sync)> = values.iter().map(|v| v.as_ref()).collect();
        writer
            .as_mut()
            .write(&refs)
            .await
            .with_context(|| format!("writing row {} into {}", row, table))?;
    }

    writer
        .finish()
        .await
        .with_context(|| format!("finishing COPY into {}", table))
}

fn downcast<'a, T: 'static>(batch: &'a RecordBatch, idx: usize, field: &Field) -> Result<&'a T> {
    batch.column(idx)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("column {} does not match its schema type", field.name()))
}

/// One row of `batch` as owned wire values, column order preserved. Nulls
/// map to SQL NULL.
fn row_values(batch: &RecordBatch, row: usize) -> Result<Vec<Box<dyn ToSql + Sync>>> {
    let schema = batch.schema();
    let mut out: Vec<Box<dyn ToSql + Sync>> = Vec::with_capacity(batch.num_columns());

    for (idx, field) in schema.fields().iter().enumerate() {
        let value: Box<dyn ToSql + Sync> = match field.data_type() {
            DataType::Int16 => {
                let arr = downcast::<Int16Array>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row)))
            }
            DataType::Int32 => {
                let arr = downcast::<Int32Array>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row)))
            }
            DataType::Int64 => {
                let arr = downcast::<Int64Array>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row)))
            }
            DataType::Float32 => {
                let arr = downcast::<Float32Array>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row)))
            }
            DataType::Float64 => {
                let arr = downcast::<Float64Array>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row)))
            }
            DataType::Boolean => {
                let arr = downcast::<BooleanArray>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row)))
            }
            DataType::Utf8 => {
                let arr = downcast::<StringArray>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row).to_string()))
            }
            DataType::LargeUtf8 => {
                let arr = downcast::<LargeStringArray>(batch, idx, field)?;
                Box::new((!arr.is_null(row)).then(|| arr.value(row).to_string()))
            }
            DataType::Timestamp(TimeUnit::Microsecond, None) => {
                let arr = downcast::<TimestampMicrosecondArray>(batch, idx, field)?;
                let ts: Option<NaiveDateTime> = if arr.is_null(row) {
                    None
                } else {
                    let us = arr.value(row);
                    Some(
                        DateTime::from_timestamp_micros(us)
                            .ok_or_else(|| {
                                anyhow!(
                                    "timestamp out of range in column {}: {}",
                                    field.name(),
                                    us
                                )
                            })?
                            .naive_utc(),
                    )
                };
                Box::new(ts)
            }
            other => bail!("unsupported column type {} for Postgres load", other),
        };
        out.push(value);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::ArrayRef;
    use arrow::datatypes::Schema as ArrowSchema;
    use std::sync::Arc;

    fn zone_schema() -> SchemaRef {
        Arc::new(ArrowSchema::new(vec![
            Field::new("LocationID", DataType::Int64, true),
            Field::new("Borough", DataType::Utf8, true),
        ]))
    }

    #[test]
    fn create_table_quotes_mixed_case_identifiers() -> Result<()> {
        let sql = create_table_sql("taxi_zones", &zone_schema())?;
        assert_eq!(
            sql,
            r#"CREATE TABLE "taxi_zones" ("LocationID" BIGINT, "Borough" TEXT)"#
        );
        Ok(())
    }

    #[test]
    fn copy_statement_lists_all_columns() {
        let stmt = copy_statement("green_trip_data", &zone_schema());
        assert_eq!(
            stmt,
            r#"COPY "green_trip_data" ("LocationID", "Borough") FROM STDIN BINARY"#
        );
    }

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn unsupported_column_type_is_fatal() {
        let schema: SchemaRef = Arc::new(ArrowSchema::new(vec![Field::new(
            "blob",
            DataType::Binary,
            true,
        )]));
        let err = create_table_sql("t", &schema).unwrap_err().to_string();
        assert!(err.contains("blob"), "unexpected message: {err}");
    }

    #[test]
    fn row_values_preserves_nulls_and_arity() -> Result<()> {
        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("at", DataType::Timestamp(TimeUnit::Microsecond, None), true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![Some(7), None])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("x"), None])) as ArrayRef,
                Arc::new(TimestampMicrosecondArray::from(vec![
                    Some(1_732_000_000_123_456),
                    None,
                ])) as ArrayRef,
            ],
        )?;

        assert_eq!(row_values(&batch, 0)?.len(), 3);
        assert_eq!(row_values(&batch, 1)?.len(), 3);
        Ok(())
    }
}
