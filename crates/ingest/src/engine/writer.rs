//! Encode Arrow batches into the lake's file formats.

use std::fmt;
use std::sync::Arc;

use apache_avro::types::Value as AvroValue;
use apache_avro::{Decimal as AvroDecimal, Schema as AvroSchema, Writer as AvroWriter};
use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Decimal256Array,
    FixedSizeBinaryArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
    Time32MillisecondArray, Time64MicrosecondArray, TimestampMicrosecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use serde_json::json;

use crate::format::AVRO_WRITER;

use super::error::EngineError;

/// The writers this engine ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Parquet,
    Csv,
    Json,
    AvroOcf,
}

impl OutputFormat {
    /// Writer identifiers are exact; aliases are resolved before this point.
    pub fn parse(format: &str) -> Result<Self, EngineError> {
        match format {
            "parquet" => Ok(OutputFormat::Parquet),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            AVRO_WRITER => Ok(OutputFormat::AvroOcf),
            other => Err(EngineError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::AvroOcf => "avro",
        }
    }

    /// Encode one batch as a complete file.
    pub fn encode(
        &self,
        batch: &RecordBatch,
        metadata: &[(String, String)],
        record_name: &str,
    ) -> Result<Vec<u8>, EngineError> {
        match self {
            OutputFormat::Parquet => write_parquet(batch, metadata),
            OutputFormat::Csv => write_csv(batch),
            OutputFormat::Json => write_json(batch),
            OutputFormat::AvroOcf => write_avro(batch, metadata, record_name),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::AvroOcf => AVRO_WRITER,
        };
        f.write_str(name)
    }
}

/// Zstd-compressed Parquet with `metadata` in the file footer.
fn write_parquet(batch: &RecordBatch, metadata: &[(String, String)]) -> Result<Vec<u8>, EngineError> {
    let kv = metadata
        .iter()
        .map(|(k, v)| KeyValue::new(k.clone(), Some(v.clone())))
        .collect::<Vec<_>>();

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .set_key_value_metadata(if kv.is_empty() { None } else { Some(kv) })
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buf)
}

/// CSV with a header row.
fn write_csv(batch: &RecordBatch) -> Result<Vec<u8>, EngineError> {
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(Vec::new());
    writer.write(batch)?;
    Ok(writer.into_inner())
}

/// Newline-delimited JSON objects.
fn write_json(batch: &RecordBatch) -> Result<Vec<u8>, EngineError> {
    let mut writer = arrow::json::LineDelimitedWriter::new(Vec::new());
    writer.write(batch)?;
    writer.finish()?;
    Ok(writer.into_inner())
}

/// Avro object container file. Every field is a `["null", T]` union.
fn write_avro(
    batch: &RecordBatch,
    metadata: &[(String, String)],
    record_name: &str,
) -> Result<Vec<u8>, EngineError> {
    let batch = avro_compatible(batch)?;
    let schema = avro_schema(batch.schema().as_ref(), record_name)?;

    let mut writer = AvroWriter::new(&schema, Vec::new());
    for (key, value) in metadata {
        writer.add_user_metadata(key.clone(), value.as_bytes())?;
    }

    let names = batch
        .schema()
        .fields()
        .iter()
        .map(|f| avro_name(f.name()))
        .collect::<Vec<_>>();

    for row in 0..batch.num_rows() {
        let mut fields = Vec::with_capacity(names.len());
        for (col, name) in batch.columns().iter().zip(&names) {
            let value = if col.is_null(row) {
                AvroValue::Union(0, Box::new(AvroValue::Null))
            } else {
                AvroValue::Union(1, Box::new(avro_value(col, row)?))
            };
            fields.push((name.clone(), value));
        }
        writer.append(AvroValue::Record(fields))?;
    }

    Ok(writer.into_inner()?)
}

/// Arrow type each column is written as. Scalars without an Avro
/// counterpart are rendered as text; nested types have no flat encoding
/// and yield `None`.
fn avro_target_type(data_type: &DataType) -> Option<DataType> {
    let target = match data_type {
        DataType::Boolean
        | DataType::Int32
        | DataType::Int64
        | DataType::Float32
        | DataType::Float64
        | DataType::Utf8
        | DataType::Binary
        | DataType::FixedSizeBinary(_)
        | DataType::Date32
        | DataType::Time32(TimeUnit::Millisecond)
        | DataType::Time64(TimeUnit::Microsecond)
        | DataType::Timestamp(TimeUnit::Microsecond, _) => data_type.clone(),
        DataType::Decimal128(_, scale) | DataType::Decimal256(_, scale) if *scale >= 0 => {
            data_type.clone()
        }
        DataType::Int8 | DataType::Int16 | DataType::UInt8 | DataType::UInt16 => DataType::Int32,
        DataType::UInt32 => DataType::Int64,
        DataType::Float16 => DataType::Float32,
        DataType::LargeUtf8 | DataType::Utf8View => DataType::Utf8,
        DataType::LargeBinary | DataType::BinaryView => DataType::Binary,
        DataType::Time32(_) => DataType::Time32(TimeUnit::Millisecond),
        DataType::Time64(_) => DataType::Time64(TimeUnit::Microsecond),
        DataType::Timestamp(_, tz) => DataType::Timestamp(TimeUnit::Microsecond, tz.clone()),
        DataType::Date64 => DataType::Timestamp(TimeUnit::Microsecond, None),
        DataType::Dictionary(_, value) => return avro_target_type(value),
        DataType::List(_)
        | DataType::LargeList(_)
        | DataType::ListView(_)
        | DataType::LargeListView(_)
        | DataType::FixedSizeList(_, _)
        | DataType::Struct(_)
        | DataType::Map(_, _)
        | DataType::Union(_, _)
        | DataType::RunEndEncoded(_, _) => return None,
        _ => DataType::Utf8,
    };
    Some(target)
}

fn avro_compatible(batch: &RecordBatch) -> Result<RecordBatch, EngineError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let target = avro_target_type(field.data_type()).ok_or_else(|| {
            EngineError::Avro(format!(
                "column `{}` of type {} has no Avro encoding",
                field.name(),
                field.data_type()
            ))
        })?;
        let column = if &target == field.data_type() {
            column.clone()
        } else {
            cast(column, &target)?
        };
        fields.push(Field::new(field.name(), target, true));
        columns.push(column);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn avro_schema(schema: &Schema, record_name: &str) -> Result<AvroSchema, EngineError> {
    let fields = schema
        .fields()
        .iter()
        .map(|field| {
            json!({
                "name": avro_name(field.name()),
                "type": ["null", avro_type(field)],
                "default": null,
            })
        })
        .collect::<Vec<_>>();

    let document = json!({
        "type": "record",
        "name": avro_name(record_name),
        "fields": fields,
    });
    Ok(AvroSchema::parse_str(&document.to_string())?)
}

fn avro_type(field: &Field) -> serde_json::Value {
    match field.data_type() {
        DataType::Boolean => json!("boolean"),
        DataType::Int32 => json!("int"),
        DataType::Int64 => json!("long"),
        DataType::Float32 => json!("float"),
        DataType::Float64 => json!("double"),
        DataType::Binary => json!("bytes"),
        DataType::FixedSizeBinary(size) => json!({
            "type": "fixed",
            "name": format!("{}_fixed", avro_name(field.name())),
            "size": size,
        }),
        DataType::Decimal128(precision, scale) | DataType::Decimal256(precision, scale) => json!({
            "type": "bytes",
            "logicalType": "decimal",
            "precision": precision,
            "scale": scale,
        }),
        DataType::Date32 => json!({"type": "int", "logicalType": "date"}),
        DataType::Time32(_) => json!({"type": "int", "logicalType": "time-millis"}),
        DataType::Time64(_) => json!({"type": "long", "logicalType": "time-micros"}),
        DataType::Timestamp(_, _) => json!({"type": "long", "logicalType": "timestamp-micros"}),
        _ => json!("string"),
    }
}

/// Avro names are `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn avro_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn avro_value(column: &ArrayRef, row: usize) -> Result<AvroValue, EngineError> {
    let value = match column.data_type() {
        DataType::Boolean => AvroValue::Boolean(downcast::<BooleanArray>(column)?.value(row)),
        DataType::Int32 => AvroValue::Int(downcast::<Int32Array>(column)?.value(row)),
        DataType::Int64 => AvroValue::Long(downcast::<Int64Array>(column)?.value(row)),
        DataType::Float32 => AvroValue::Float(downcast::<Float32Array>(column)?.value(row)),
        DataType::Float64 => AvroValue::Double(downcast::<Float64Array>(column)?.value(row)),
        DataType::Binary => AvroValue::Bytes(downcast::<BinaryArray>(column)?.value(row).to_vec()),
        DataType::FixedSizeBinary(_) => {
            let bytes = downcast::<FixedSizeBinaryArray>(column)?.value(row).to_vec();
            AvroValue::Fixed(bytes.len(), bytes)
        }
        DataType::Decimal128(_, _) => {
            let unscaled = downcast::<Decimal128Array>(column)?.value(row);
            AvroValue::Decimal(AvroDecimal::from(unscaled.to_be_bytes()))
        }
        DataType::Decimal256(_, _) => {
            let unscaled = downcast::<Decimal256Array>(column)?.value(row);
            AvroValue::Decimal(AvroDecimal::from(unscaled.to_be_bytes()))
        }
        DataType::Time32(_) => {
            AvroValue::TimeMillis(downcast::<Time32MillisecondArray>(column)?.value(row))
        }
        DataType::Date32 => AvroValue::Date(downcast::<Date32Array>(column)?.value(row)),
        DataType::Time64(_) => {
            AvroValue::TimeMicros(downcast::<Time64MicrosecondArray>(column)?.value(row))
        }
        DataType::Timestamp(_, _) => {
            AvroValue::TimestampMicros(downcast::<TimestampMicrosecondArray>(column)?.value(row))
        }
        _ => AvroValue::String(downcast::<StringArray>(column)?.value(row).to_string()),
    };
    Ok(value)
}

fn downcast<T: 'static>(column: &ArrayRef) -> Result<&T, EngineError> {
    column.as_any().downcast_ref::<T>().ok_or_else(|| {
        EngineError::Avro(format!("unexpected array type {}", column.data_type()))
    })
}
