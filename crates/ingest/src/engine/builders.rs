//! Build typed Arrow arrays from Postgres result rows.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, StringArray, Time64MicrosecondArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::types::JsonValue;
use sqlx::{Column, Postgres, Row, TypeInfo};

use super::error::EngineError;
use super::options::ReadOptions;

/// How a source column is decoded. One variant per supported wire type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Text,
    Uuid,
    Json,
    Date,
    DateAsTimestamp,
    Time,
    Timestamp,
    TimestampTz,
    Bytes,
}

impl ColumnKind {
    /// Map a Postgres type name. `None` for types with no decoding here.
    pub(crate) fn from_type_name(name: &str, options: &ReadOptions) -> Option<Self> {
        let kind = match name {
            "INT2" => ColumnKind::Int16,
            "INT4" => ColumnKind::Int32,
            "INT8" => ColumnKind::Int64,
            "FLOAT4" => ColumnKind::Float32,
            "FLOAT8" => ColumnKind::Float64,
            "BOOL" => ColumnKind::Bool,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => ColumnKind::Text,
            "UUID" => ColumnKind::Uuid,
            "JSON" | "JSONB" => ColumnKind::Json,
            "DATE" if options.map_date_to_timestamp => ColumnKind::DateAsTimestamp,
            "DATE" => ColumnKind::Date,
            "TIME" => ColumnKind::Time,
            "TIMESTAMP" => ColumnKind::Timestamp,
            "TIMESTAMPTZ" => ColumnKind::TimestampTz,
            "BYTEA" => ColumnKind::Bytes,
            _ => return None,
        };
        Some(kind)
    }

    pub(crate) fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Int16 => DataType::Int16,
            ColumnKind::Int32 => DataType::Int32,
            ColumnKind::Int64 => DataType::Int64,
            ColumnKind::Float32 => DataType::Float32,
            ColumnKind::Float64 => DataType::Float64,
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Text | ColumnKind::Uuid | ColumnKind::Json => DataType::Utf8,
            ColumnKind::Date => DataType::Date32,
            ColumnKind::DateAsTimestamp | ColumnKind::Timestamp => {
                DataType::Timestamp(TimeUnit::Microsecond, None)
            }
            ColumnKind::TimestampTz => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            ColumnKind::Time => DataType::Time64(TimeUnit::Microsecond),
            ColumnKind::Bytes => DataType::Binary,
        }
    }
}

/// Resolve column kinds and the Arrow schema for a prepared statement.
///
/// Every column is nullable; the wire protocol does not report nullability.
pub(crate) fn build_schema(
    columns: &[PgColumn],
    options: &ReadOptions,
) -> Result<(Schema, Vec<ColumnKind>), EngineError> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut kinds = Vec::with_capacity(columns.len());

    for column in columns {
        let type_name = column.type_info().name();
        let kind = ColumnKind::from_type_name(type_name, options).ok_or_else(|| {
            EngineError::UnsupportedColumnType {
                column: column.name().to_string(),
                type_name: type_name.to_string(),
            }
        })?;
        fields.push(Field::new(column.name(), kind.data_type(), true));
        kinds.push(kind);
    }

    Ok((Schema::new(fields), kinds))
}

/// Decode every row into one array per column, in column order.
pub(crate) fn build_arrays(rows: &[PgRow], kinds: &[ColumnKind]) -> Result<Vec<ArrayRef>, EngineError> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(kinds.len());

    for (idx, kind) in kinds.iter().enumerate() {
        let array: ArrayRef = match kind {
            ColumnKind::Int16 => Arc::new(Int16Array::from(decode::<i16>(rows, idx)?)),
            ColumnKind::Int32 => Arc::new(Int32Array::from(decode::<i32>(rows, idx)?)),
            ColumnKind::Int64 => Arc::new(Int64Array::from(decode::<i64>(rows, idx)?)),
            ColumnKind::Float32 => Arc::new(Float32Array::from(decode::<f32>(rows, idx)?)),
            ColumnKind::Float64 => Arc::new(Float64Array::from(decode::<f64>(rows, idx)?)),
            ColumnKind::Bool => Arc::new(BooleanArray::from(decode::<bool>(rows, idx)?)),
            ColumnKind::Text => Arc::new(StringArray::from(decode::<String>(rows, idx)?)),
            ColumnKind::Uuid => {
                let values = decode::<uuid::Uuid>(rows, idx)?;
                Arc::new(StringArray::from_iter(
                    values.iter().map(|v| v.map(|u| u.to_string())),
                ))
            }
            ColumnKind::Json => {
                let values = decode::<JsonValue>(rows, idx)?;
                Arc::new(StringArray::from_iter(
                    values.iter().map(|v| v.as_ref().map(|j| j.to_string())),
                ))
            }
            ColumnKind::Date => {
                let values = decode::<NaiveDate>(rows, idx)?;
                Arc::new(Date32Array::from_iter(values.iter().map(|v| v.map(days_since_epoch))))
            }
            ColumnKind::DateAsTimestamp => {
                let values = decode::<NaiveDate>(rows, idx)?;
                Arc::new(TimestampMicrosecondArray::from_iter(
                    values
                        .iter()
                        .map(|v| v.map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp_micros())),
                ))
            }
            ColumnKind::Time => {
                let values = decode::<NaiveTime>(rows, idx)?;
                Arc::new(Time64MicrosecondArray::from_iter(
                    values.iter().map(|v| v.map(micros_since_midnight)),
                ))
            }
            ColumnKind::Timestamp => {
                let values = decode::<NaiveDateTime>(rows, idx)?;
                Arc::new(TimestampMicrosecondArray::from_iter(
                    values.iter().map(|v| v.map(|ts| ts.and_utc().timestamp_micros())),
                ))
            }
            ColumnKind::TimestampTz => {
                let values = decode::<DateTime<Utc>>(rows, idx)?;
                Arc::new(
                    TimestampMicrosecondArray::from_iter(
                        values.iter().map(|v| v.map(|ts| ts.timestamp_micros())),
                    )
                    .with_timezone("UTC"),
                )
            }
            ColumnKind::Bytes => {
                let values = decode::<Vec<u8>>(rows, idx)?;
                Arc::new(BinaryArray::from_iter(values))
            }
        };
        arrays.push(array);
    }

    Ok(arrays)
}

fn decode<T>(rows: &[PgRow], idx: usize) -> Result<Vec<Option<T>>, EngineError>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    rows.iter()
        .map(|row| row.try_get::<Option<T>, _>(idx))
        .collect::<Result<Vec<_>, _>>()
        .map_err(EngineError::from)
}

pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(DateTime::<Utc>::UNIX_EPOCH.date_naive())
        .num_days() as i32
}

fn micros_since_midnight(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1_000_000 + (time.nanosecond() / 1_000) as i64
}
