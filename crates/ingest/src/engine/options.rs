//! Session-level read options applied to every extraction.
//!
//! These are fixed for every table. They pin down how the source renders
//! dates and timestamps so downstream typed columns come out consistently.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// SQL spelling for `SET TRANSACTION ISOLATION LEVEL ...`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IsolationLevel::ReadUncommitted => "READ_UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ_COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE_READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub date_format: &'static str,
    pub timestamp_format: &'static str,
    /// When false, DATE columns stay dates instead of being widened to timestamps.
    pub map_date_to_timestamp: bool,
    pub driver: &'static str,
    pub isolation_level: IsolationLevel,
}

impl ReadOptions {
    pub const fn session_defaults() -> Self {
        Self {
            date_format: "YYYY-MM-DD",
            timestamp_format: "YYYY-MM-DD HH24:MI:SS.FF",
            map_date_to_timestamp: false,
            driver: "oracle.jdbc.OracleDriver",
            isolation_level: IsolationLevel::ReadCommitted,
        }
    }

    /// The options as driver properties, in a stable order.
    pub fn driver_properties(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dateFormat", self.date_format.to_string()),
            ("timestampFormat", self.timestamp_format.to_string()),
            ("oracle.jdbc.mapDateToTimestamp", self.map_date_to_timestamp.to_string()),
            ("driver", self.driver.to_string()),
            ("isolationLevel", self.isolation_level.to_string()),
        ]
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::session_defaults()
    }
}
