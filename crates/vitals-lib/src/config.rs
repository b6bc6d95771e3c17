use crate::align::AlignConfig;
use crate::error::ConfigError;
use crate::metrics::daily::DashboardConfig;
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contents of a `vitals.toml` file. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    pub align: AlignConfig,
    pub dashboard: DashboardConfig,
    pub session: SessionConfig,
}

impl VitalsConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: VitalsConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.align.validate()?;
        self.dashboard.validate()?;
        self.session.validate()
    }
}

pub fn load_config(path: &Path) -> Result<VitalsConfig, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
    VitalsConfig::from_toml(&text)
}
