//! Extraction query construction.
//!
//! The result is handed to the engine as a "query as table": either a bare
//! table reference or a parenthesized subquery. Inputs are trusted job
//! configuration and are spliced in verbatim; no quoting or escaping happens
//! here, and `lastValue` must already be a valid SQL literal.

use chrono::{DateTime, Duration, Utc};

use sluice_core::{value_of, ConfigOption, MissingOption};

use crate::dialect::DbFamily;
use crate::mode::IngestionMode;

/// Build the extraction query for `table` under `mode`.
///
/// `options` are the table's own options; `checkField` (daily and
/// incrementally) and `lastValue` (incrementally) are mandatory there.
/// Daily runs select the UTC calendar day before `run_at`.
pub fn build_query(
    table: &str,
    mode: IngestionMode,
    options: &[ConfigOption],
    family: &DbFamily,
    run_at: DateTime<Utc>,
) -> Result<String, MissingOption> {
    match mode {
        IngestionMode::Full => Ok(table.to_string()),
        IngestionMode::Daily => {
            let check_field = value_of("checkField", options)?;
            let literal = family.date_literal(&previous_day(run_at));
            Ok(format!("(SELECT * FROM {table} WHERE {check_field} = {literal})"))
        }
        IngestionMode::Incrementally => {
            let check_field = value_of("checkField", options)?;
            let last_value = value_of("lastValue", options)?;
            Ok(format!("(SELECT * FROM {table} WHERE {check_field} >= {last_value})"))
        }
    }
}

/// `yyyy-MM-dd` of the UTC day before `run_at`.
pub fn previous_day(run_at: DateTime<Utc>) -> String {
    (run_at.date_naive() - Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}
