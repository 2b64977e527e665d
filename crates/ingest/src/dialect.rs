//! Source database families and their SQL conventions.
//!
//! All dialect knowledge lives in [`DialectSpec`] entries: how to build a
//! connection string from host/port/database, and how to write a date
//! literal. Supporting another database means adding a family and its entry.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbFamily {
    Oracle,
    Postgres,
    /// Any `dbType` we have no dialect entry for. Keeps the raw value for
    /// diagnostics.
    Unknown(String),
}

/// Per-family templates. `{host}`, `{port}`, `{db}` and `{date}` are
/// substituted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectSpec {
    /// `None` means the family cannot synthesize a target; an explicit `url`
    /// option is needed.
    pub connection_template: Option<&'static str>,
    pub date_literal_template: &'static str,
}

const ORACLE: DialectSpec = DialectSpec {
    connection_template: Some("jdbc:oracle:thin:/@{host}:{port}/{db}"),
    date_literal_template: "TO_DATE('{date}','yyyy-MM-dd')",
};

const POSTGRES: DialectSpec = DialectSpec {
    connection_template: None,
    date_literal_template: "'{date}'",
};

const GENERIC: DialectSpec = DialectSpec {
    connection_template: None,
    date_literal_template: "'{date}'",
};

impl DbFamily {
    /// Case-insensitive; unrecognized names become [`DbFamily::Unknown`].
    pub fn parse(db_type: &str) -> Self {
        match db_type.trim().to_ascii_lowercase().as_str() {
            "oracle" => DbFamily::Oracle,
            "postgres" | "postgresql" => DbFamily::Postgres,
            _ => DbFamily::Unknown(db_type.to_string()),
        }
    }

    pub fn dialect(&self) -> &'static DialectSpec {
        match self {
            DbFamily::Oracle => &ORACLE,
            DbFamily::Postgres => &POSTGRES,
            DbFamily::Unknown(_) => &GENERIC,
        }
    }

    /// Render a `yyyy-MM-dd` date as a literal for this family.
    pub fn date_literal(&self, date: &str) -> String {
        self.dialect().date_literal_template.replace("{date}", date)
    }

    /// Synthesize a connection string, or an empty (unusable) target when
    /// the family has no template.
    pub fn connection_string(&self, host: &str, port: &str, db: &str) -> String {
        match self.dialect().connection_template {
            Some(template) => template
                .replace("{host}", host)
                .replace("{port}", port)
                .replace("{db}", db),
            None => String::new(),
        }
    }
}

impl fmt::Display for DbFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbFamily::Oracle => f.write_str("oracle"),
            DbFamily::Postgres => f.write_str("postgres"),
            DbFamily::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}
