//! Hive-style partitioning: one `key=value` directory per distinct value.

use std::collections::BTreeMap;

use arrow::array::{Array, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

use super::error::EngineError;

/// Directory value used for null partition keys.
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Split `batch` on `column`. Each part drops the partition column and is
/// paired with its `column=value` directory name. Parts come out in
/// directory-name order.
pub(crate) fn split_by_column(
    batch: &RecordBatch,
    column: &str,
) -> Result<Vec<(String, RecordBatch)>, EngineError> {
    let schema = batch.schema();
    let (key_idx, _) = schema
        .column_with_name(column)
        .ok_or_else(|| EngineError::PartitionColumnMissing(column.to_string()))?;
    let keys = batch.column(key_idx);

    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let value = if keys.is_null(row) {
            HIVE_DEFAULT_PARTITION.to_string()
        } else {
            escape_path_value(&array_value_to_string(keys, row)?)
        };
        groups.entry(value).or_default().push(row as u32);
    }

    let keep: Vec<usize> = (0..batch.num_columns()).filter(|i| *i != key_idx).collect();

    groups
        .into_iter()
        .map(|(value, rows)| {
            let part = take_record_batch(batch, &UInt32Array::from(rows))?;
            Ok((format!("{column}={value}"), part.project(&keep)?))
        })
        .collect()
}

/// Percent-encode characters that cannot appear in a partition directory.
pub(crate) fn escape_path_value(value: &str) -> String {
    if value.is_empty() {
        return HIVE_DEFAULT_PARTITION.to_string();
    }
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{b:02X}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn needs_escape(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}
