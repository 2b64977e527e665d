//! Project extracted data onto a registered schema.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::compute::cast;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use crate::engine::{EngineError, TabularData};
use crate::error::IngestError;

/// Select every field of `schema`, in schema order, casting each to its
/// registered type. Extracted columns the schema does not name are dropped.
///
/// Names match exactly first, then ASCII case-insensitively. Values that do
/// not survive the cast become null.
pub fn reconcile(table: &TabularData, schema: &SchemaRef) -> Result<TabularData, IngestError> {
    let source = table.schema();
    let indices = schema
        .fields()
        .iter()
        .map(|field| {
            column_index(&source, field.name()).ok_or_else(|| IngestError::ProjectionMismatch {
                field: field.name().clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dropped = source.fields().len().saturating_sub(indices.len());
    debug!(fields = schema.fields().len(), dropped, "reconciling against registered schema");

    let batches = table
        .batches()
        .iter()
        .map(|batch| project_batch(batch, &indices, schema))
        .collect::<Result<Vec<_>, EngineError>>()?;

    Ok(TabularData::new(schema.clone(), batches))
}

fn column_index(source: &Schema, name: &str) -> Option<usize> {
    source
        .fields()
        .iter()
        .position(|f| f.name() == name)
        .or_else(|| {
            source
                .fields()
                .iter()
                .position(|f| f.name().eq_ignore_ascii_case(name))
        })
}

fn project_batch(
    batch: &RecordBatch,
    indices: &[usize],
    schema: &SchemaRef,
) -> Result<RecordBatch, EngineError> {
    let columns = indices
        .iter()
        .zip(schema.fields())
        .map(|(&idx, field)| {
            let column = batch.column(idx);
            if column.data_type() == field.data_type() {
                Ok(column.clone())
            } else {
                cast(column, field.data_type())
            }
        })
        .collect::<Result<Vec<ArrayRef>, _>>()?;
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array, BooleanArray, Int32Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field};

    use super::*;

    fn extracted() -> TabularData {
        let schema = Arc::new(Schema::new(vec![
            Field::new("NAME", DataType::Utf8, true),
            Field::new("legacy_flag", DataType::Boolean, true),
            Field::new("id", DataType::Int32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Alice", "Bob"])),
                Arc::new(BooleanArray::from(vec![true, false])),
                Arc::new(Int32Array::from(vec![1, 2])),
            ],
        )
        .unwrap();
        TabularData::from_batch(batch)
    }

    fn registered() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
        ]))
    }

    #[test]
    fn projects_casts_and_reorders() {
        let out = reconcile(&extracted(), &registered()).unwrap();
        assert_eq!(out.column_names(), vec!["id", "name"]);

        let batch = out.concat().unwrap();
        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.values(), &[1, 2]);
        let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(1), "Bob");
    }

    #[test]
    fn exact_match_beats_case_insensitive() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Code", DataType::Utf8, true),
            Field::new("code", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["upper"])),
                Arc::new(StringArray::from(vec!["lower"])),
            ],
        )
        .unwrap();
        let registered = Arc::new(Schema::new(vec![Field::new("code", DataType::Utf8, true)]));
        let out = reconcile(&TabularData::from_batch(batch), &registered).unwrap();
        let batch = out.concat().unwrap();
        let col = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(col.value(0), "lower");
    }

    #[test]
    fn missing_field_is_projection_mismatch() {
        let registered = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("email", DataType::Utf8, true),
        ]));
        let err = reconcile(&extracted(), &registered).unwrap_err();
        assert!(matches!(err, IngestError::ProjectionMismatch { ref field } if field == "email"));
    }

    #[test]
    fn failed_casts_become_null() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["7", "seven"]))],
        )
        .unwrap();
        let registered = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
        let out = reconcile(&TabularData::from_batch(batch), &registered).unwrap();
        let batch = out.concat().unwrap();
        let col = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(col.value(0), 7);
        assert!(col.is_null(1));
    }

    #[test]
    fn empty_table_keeps_registered_shape() {
        let empty = TabularData::empty(extracted().schema());
        let out = reconcile(&empty, &registered()).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.schema(), registered());
    }
}
