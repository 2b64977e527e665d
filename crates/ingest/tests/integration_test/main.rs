//! Integration tests for sluice-ingest.
//!
//! Tables are driven end to end through `process_table` with a recording
//! engine in place of a live database. Writes land in a temporary local lake.

mod fake;
mod output;
mod scenarios;
