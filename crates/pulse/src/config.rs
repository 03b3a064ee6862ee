use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_offsets_dir")]
    pub offsets_dir: String,
    /// Records emitted between two offset commits.
    #[serde(default = "default_commit_interval")]
    pub commit_interval: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_offsets_dir() -> String {
    ".pulse/offsets".to_string()
}

fn default_commit_interval() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Loads settings from `config_path` (or `PULSE_CONFIG_PATH`) when given,
    /// then applies `PULSE__*` environment overrides.
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let config_file_path =
            config_path.map(str::to_string).or_else(|| std::env::var("PULSE_CONFIG_PATH").ok());

        let mut builder = config::Config::builder();
        if let Some(path) = config_file_path {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }
        let s = builder
            .add_source(config::Environment::with_prefix("PULSE").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
