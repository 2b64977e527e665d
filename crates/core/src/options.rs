//! Named configuration sections and their ordered key/value options.
//!
//! A [`ConfigItem`] is one source, one sink, or one table entry. Its options
//! keep the order they were declared in; lookups scan front to back and the
//! first option with a matching name wins. Nothing here enforces uniqueness.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single `name = value` option. Both sides are plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOption {
    pub name: String,
    pub value: String,
}

impl ConfigOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named configuration section (one source, sink, or table).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    #[serde(default)]
    pub options: Option<Vec<ConfigOption>>,
}

impl ConfigItem {
    pub fn new(name: impl Into<String>, options: Vec<ConfigOption>) -> Self {
        Self {
            name: name.into(),
            options: Some(options),
        }
    }

    /// Options as a slice; a section without an options list behaves as empty.
    pub fn options(&self) -> &[ConfigOption] {
        self.options.as_deref().unwrap_or(&[])
    }

    pub fn find(&self, name: &str) -> Option<&ConfigOption> {
        find_option(name, self.options())
    }

    /// Mandatory lookup. The error names this section.
    pub fn require(&self, name: &str) -> Result<&str, MissingOption> {
        value_of(name, self.options()).map_err(|e| e.in_section(&self.name))
    }
}

/// Return the first option called `name`, or `None`.
pub fn find_option<'a>(name: &str, options: &'a [ConfigOption]) -> Option<&'a ConfigOption> {
    options.iter().find(|opt| opt.name == name)
}

/// Return the value of the first option called `name`.
///
/// Every caller treats the option as mandatory, so absence is an error the
/// caller must propagate rather than a default.
pub fn value_of<'a>(name: &str, options: &'a [ConfigOption]) -> Result<&'a str, MissingOption> {
    find_option(name, options)
        .map(|opt| opt.value.as_str())
        .ok_or_else(|| MissingOption::new(name))
}

/// A mandatory option was not present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingOption {
    pub option: String,
    pub section: Option<String>,
}

impl MissingOption {
    pub fn new(option: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            section: None,
        }
    }

    /// Attach the offending section name, keeping one that is already set.
    pub fn in_section(mut self, section: &str) -> Self {
        if self.section.is_none() {
            self.section = Some(section.to_string());
        }
        self
    }
}

impl fmt::Display for MissingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.section {
            Some(section) => write!(
                f,
                "missing mandatory option `{}` in config section `{}`",
                self.option, section
            ),
            None => write!(f, "missing mandatory option `{}`", self.option),
        }
    }
}

impl std::error::Error for MissingOption {}
