use std::fmt;

/// Which extraction query and write semantics apply to a table run.
///
/// Parsing never fails: anything other than exactly `"daily"` or
/// `"incrementally"` is a full reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestionMode {
    #[default]
    Full,
    Daily,
    Incrementally,
}

impl IngestionMode {
    pub fn parse(mode: &str) -> Self {
        match mode {
            "daily" => IngestionMode::Daily,
            "incrementally" => IngestionMode::Incrementally,
            _ => IngestionMode::Full,
        }
    }

    /// Daily snapshots append; full reloads and incremental runs overwrite
    /// the destination.
    pub fn write_mode(&self) -> WriteMode {
        match self {
            IngestionMode::Daily => WriteMode::Append,
            IngestionMode::Full | IngestionMode::Incrementally => WriteMode::Overwrite,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionMode::Full => "full",
            IngestionMode::Daily => "daily",
            IngestionMode::Incrementally => "incrementally",
        }
    }
}

impl From<&str> for IngestionMode {
    fn from(mode: &str) -> Self {
        Self::parse(mode)
    }
}

impl fmt::Display for IngestionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Overwrite,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Append => f.write_str("append"),
            WriteMode::Overwrite => f.write_str("overwrite"),
        }
    }
}
