//! Output format aliases. A requested format either maps to a writer
//! identifier here or is passed through unchanged for the engine to accept
//! or reject.

/// Writer identifier for Avro object container files.
pub const AVRO_WRITER: &str = "avro-ocf";

const FORMAT_ALIASES: &[(&str, &str)] = &[("avro", AVRO_WRITER)];

pub fn resolve_format(format: &str) -> String {
    FORMAT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == format)
        .map(|(_, writer)| writer.to_string())
        .unwrap_or_else(|| format.to_string())
}
