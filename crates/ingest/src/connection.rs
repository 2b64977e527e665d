//! Source connection resolution from the source section and table options.

use sluice_core::{find_option, ConfigItem, ConfigOption};
use tracing::{debug, warn};

use crate::dialect::DbFamily;
use crate::error::IngestError;

/// Where and how to read a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub family: DbFamily,
    /// Driver connection string. Empty when the family cannot synthesize one.
    pub url: String,
}

impl ConnectionTarget {
    /// The connection string with any `user:password@` password masked.
    pub fn redacted(&self) -> String {
        redact_url(&self.url)
    }
}

/// Resolve the database family and connection string for one table.
///
/// `dbType` is mandatory on the source. A table-level `url` is used verbatim.
/// Otherwise `host`, `port` and `dbName` are required (table options first,
/// then the source) and rendered through the family's template. Missing
/// options are reported against the source section.
pub fn resolve_connection(
    source: &ConfigItem,
    table_options: &[ConfigOption],
) -> Result<ConnectionTarget, IngestError> {
    let db_type = source
        .require("dbType")
        .map_err(|e| IngestError::missing(e, &source.name))?;
    let family = DbFamily::parse(db_type);

    if let Some(url) = find_option("url", table_options) {
        debug!(source = %source.name, "using explicit table url");
        return Ok(ConnectionTarget {
            family,
            url: url.value.clone(),
        });
    }

    let host = endpoint_option("host", source, table_options)?;
    let port = endpoint_option("port", source, table_options)?;
    let db_name = endpoint_option("dbName", source, table_options)?;

    let url = family.connection_string(host, port, db_name);
    if url.is_empty() {
        warn!(
            source = %source.name,
            db_type = %family,
            "no connection template for this database type; set an explicit `url` option"
        );
    }
    Ok(ConnectionTarget { family, url })
}

fn endpoint_option<'a>(
    name: &str,
    source: &'a ConfigItem,
    table_options: &'a [ConfigOption],
) -> Result<&'a str, IngestError> {
    find_option(name, table_options)
        .or_else(|| source.find(name))
        .map(|opt| opt.value.as_str())
        .ok_or_else(|| IngestError::MissingOption {
            option: name.to_string(),
            section: source.name.clone(),
        })
}

fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let Some(at) = rest.find('@') else {
        return url.to_string();
    };
    let userinfo = &rest[..at];
    match userinfo.find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &url[..scheme_end + 3],
            &userinfo[..colon],
            &rest[at..]
        ),
        None => url.to_string(),
    }
}
