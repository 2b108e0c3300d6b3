// Configuration module entry point
// Layered configuration: defaults, optional file, then environment

mod types;

pub use types::{Config, EngineConfig, LoggingConfig};

/// Environment variable prefix, e.g. `POTETO_ENGINE__PREFIX`
pub const ENV_PREFIX: &str = "POTETO";

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_FILE: &str = "poteto";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error; defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("engine.prefix", "Poteto")?
            .set_default("engine.persist_cwd", false)?
            .set_default("engine.server_name", "poteto")?
            .set_default("engine.read_chunk_size", 65_536)?
            .set_default("logging.level", "warn")?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "common")?
            .build()?;

        settings.try_deserialize()
    }
}
