use std::path::PathBuf;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    /// SERPs parsed per parallel chunk before results are written.
    pub batch_size: usize,
    pub with_features: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/serps.sqlite"),
            batch_size: 500,
            with_features: true,
        }
    }
}

impl Settings {
    /// `serp_parser.toml` when present, then `SERP_*` environment variables.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .add_source(config::File::with_name("serp_parser").required(false))
            .add_source(config::Environment::with_prefix("SERP").try_parsing(true))
            .build()
            .context("loading settings")?;
        let settings: Settings = config.try_deserialize().context("invalid settings")?;
        Ok(Settings {
            batch_size: settings.batch_size.max(1),
            ..settings
        })
    }
}
