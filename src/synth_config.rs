use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use tracing::info;

use crate::{backup_schedule::BackupTarget, constants, model::Error};

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SynthConfig {
    /// YAML list of the add-on components available for installation
    pub catalog_path: String,
    /// YAML snapshot of the cluster creation form
    #[serde(default)]
    pub cluster_form_path: Option<String>,
    #[serde(default)]
    pub backup: Option<BackupJobConfig>,
    /// Send the documents to the API server instead of printing them
    #[serde(default)]
    pub submit: bool,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BackupJobConfig {
    /// YAML snapshot of the scheduled backup form
    pub form_path: String,
    pub cluster: BackupTarget,
}

impl SynthConfig {
    /// Location of the configuration file for the given environment
    pub fn config_path(environment: &str) -> Result<PathBuf, Error> {
        if environment.eq("production") {
            Ok(PathBuf::from(constants::PRODUCTION_CONFIG_PATH))
        } else {
            Ok(env::current_dir()?.join(format!("sample_config-{environment}.yaml")))
        }
    }

    /// Reads the configuration selected by the `SYNTH_ENVIRONMENT` variable
    pub fn load() -> Result<Self, Error> {
        let environment = env::var(constants::SYNTH_ENVIRONMENT)
            .map_err(|_| Error::ConfigError(format!("{} is not set", constants::SYNTH_ENVIRONMENT)))?;
        let config_path = Self::config_path(&environment)?;
        info!("Loading configuration from {}", config_path.display());
        let config_file = std::fs::File::open(&config_path)?;
        let config: SynthConfig = serde_yaml::from_reader(config_file)?;
        Ok(config)
    }
}
