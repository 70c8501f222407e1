mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{ConfigError, Environment, PaginationSettings, Settings, StorageProvider};
