//! Avro schema document to Arrow schema.

use apache_avro::schema::{Schema as AvroSchema, SchemaKind};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};

use crate::error::IngestError;

const UTC: &str = "UTC";

/// Translate a record schema document into Arrow fields, one per record
/// field, all nullable. Unmapped field types fail the whole translation.
pub fn avro_to_arrow(document: &str) -> Result<Schema, IngestError> {
    let parsed = AvroSchema::parse_str(document).map_err(|e| IngestError::SchemaParse(e.to_string()))?;
    let AvroSchema::Record(record) = &parsed else {
        return Err(IngestError::SchemaParse(format!(
            "expected a record schema, found {}",
            kind_name(&parsed)
        )));
    };

    let fields = record
        .fields
        .iter()
        .map(|field| {
            let data_type = arrow_type(&field.schema).ok_or_else(|| IngestError::UnmappedSchemaType {
                field: field.name.clone(),
                avro_type: kind_name(&field.schema),
            })?;
            Ok(Field::new(&field.name, data_type, true))
        })
        .collect::<Result<Vec<_>, IngestError>>()?;

    Ok(Schema::new(fields))
}

fn arrow_type(schema: &AvroSchema) -> Option<DataType> {
    match schema {
        AvroSchema::Union(union) => {
            let non_null: Vec<&AvroSchema> = union
                .variants()
                .iter()
                .filter(|v| SchemaKind::from(*v) != SchemaKind::Null)
                .collect();
            match non_null.as_slice() {
                [] => Some(DataType::Null),
                [single] if !matches!(single, AvroSchema::Union(_)) => arrow_type(single),
                _ => None,
            }
        }
        AvroSchema::Fixed(fixed) => i32::try_from(fixed.size).ok().map(DataType::FixedSizeBinary),
        AvroSchema::Decimal(decimal) => decimal_type(decimal.precision, decimal.scale),
        other => primitive_type(SchemaKind::from(other)),
    }
}

fn primitive_type(kind: SchemaKind) -> Option<DataType> {
    let data_type = match kind {
        SchemaKind::Null => DataType::Null,
        SchemaKind::Boolean => DataType::Boolean,
        SchemaKind::Int => DataType::Int32,
        SchemaKind::Long => DataType::Int64,
        SchemaKind::Float => DataType::Float32,
        SchemaKind::Double => DataType::Float64,
        SchemaKind::Bytes => DataType::Binary,
        SchemaKind::String | SchemaKind::Enum | SchemaKind::Uuid => DataType::Utf8,
        SchemaKind::Date => DataType::Date32,
        SchemaKind::TimeMillis => DataType::Time32(TimeUnit::Millisecond),
        SchemaKind::TimeMicros => DataType::Time64(TimeUnit::Microsecond),
        SchemaKind::TimestampMillis => DataType::Timestamp(TimeUnit::Millisecond, Some(UTC.into())),
        SchemaKind::TimestampMicros => DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into())),
        SchemaKind::TimestampNanos => DataType::Timestamp(TimeUnit::Nanosecond, Some(UTC.into())),
        SchemaKind::LocalTimestampMillis => DataType::Timestamp(TimeUnit::Millisecond, None),
        SchemaKind::LocalTimestampMicros => DataType::Timestamp(TimeUnit::Microsecond, None),
        SchemaKind::LocalTimestampNanos => DataType::Timestamp(TimeUnit::Nanosecond, None),
        _ => return None,
    };
    Some(data_type)
}

fn decimal_type(precision: usize, scale: usize) -> Option<DataType> {
    let precision = u8::try_from(precision).ok()?;
    let scale = i8::try_from(scale).ok()?;
    match precision {
        1..=38 => Some(DataType::Decimal128(precision, scale)),
        39..=76 => Some(DataType::Decimal256(precision, scale)),
        _ => None,
    }
}

fn kind_name(schema: &AvroSchema) -> String {
    format!("{:?}", SchemaKind::from(schema)).to_lowercase()
}
