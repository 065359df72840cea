use config::{ConfigBuilder, Environment, File, FileFormat};
use tourcms_sdk::{ClientConfig, ClientSettings};

/// CLI configuration (from apps/cli/config.toml plus TOURCMS_* env vars)
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientSettings,
}

impl Config {
    /// Load configuration, env vars taking precedence over the file.
    ///
    /// The path defaults to `TOURCMS_CONFIG`, then to the config.toml next
    /// to this crate's manifest. A missing file is not an error, so
    /// credentials can come from the environment alone.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let config_path = path
            .map(str::to_string)
            .or_else(|| std::env::var("TOURCMS_CONFIG").ok())
            .unwrap_or_else(|| format!("{}/config.toml", env!("CARGO_MANIFEST_DIR")));

        let builder = config::Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("TOURCMS"));

        Self::finish(builder)
    }

    /// Load from TOML text only, ignoring files and the environment
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        Self::finish(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn finish(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let client = builder.build()?.try_deserialize::<ClientSettings>()?;
        Ok(Self { client })
    }

    /// Apply command-line overrides and validate into a client config
    pub fn into_client_config(
        mut self,
        parsed: bool,
        debug: bool,
    ) -> tourcms_sdk::SdkResult<ClientConfig> {
        if parsed {
            self.client.result_mode = tourcms_sdk::ResultMode::Parsed;
        }
        if debug {
            self.client.debug_trace = true;
        }
        ClientConfig::try_from(self.client)
    }
}
