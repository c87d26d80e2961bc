use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::api::CallerId;

/// Server settings, read from `LIBRARY_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub use_in_memory_db: bool,
    pub db_host: String,
    pub db_username: String,
    pub db_password: String,
    pub bind_host: String,
    pub port: u16,
    /// Identities holding the librarian role at start-up, comma separated in the environment
    pub librarians: Vec<CallerId>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("use_in_memory_db", false)?
            .set_default("db_host", "127.0.0.1")?
            .set_default("db_username", "postgres")?
            .set_default("db_password", "postgres")?
            .set_default("bind_host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("librarians", vec!["librarian"])?
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("librarians"),
            )
            .build()?
            .try_deserialize()
    }
}
