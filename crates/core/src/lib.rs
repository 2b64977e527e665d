pub mod config;
pub mod credentials;
pub mod error;
pub mod job;
pub mod options;

pub use config::Config;
pub use credentials::Credentials;
pub use error::*;
pub use job::{JobFile, TableEntry};
pub use options::{find_option, value_of, ConfigItem, ConfigOption, MissingOption};
