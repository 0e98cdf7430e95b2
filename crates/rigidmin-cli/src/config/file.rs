use crate::error::{CliError, Result};
use rigidmin::engine::config::CurvaturePolicy;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSystemConfig {
    pub nrigid: Option<usize>,
    pub seed: Option<u64>,
    pub accelerated_path: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FilePotentialConfig {
    pub epsilon: Option<f64>,
    pub sigma: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileLbfgsConfig {
    pub history_size: Option<usize>,
    pub max_step: Option<f64>,
    pub initial_inverse_hessian: Option<f64>,
    pub scale_inverse_hessian: Option<bool>,
    pub curvature_policy: Option<CurvaturePolicy>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileQuenchConfig {
    pub max_iterations: Option<usize>,
    pub tolerance: Option<f64>,
    pub max_energy_rise: Option<f64>,
    pub max_backtracks: Option<usize>,
}

/// Every section and key is optional; missing values fall back to the defaults.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub system: Option<FileSystemConfig>,
    pub potential: Option<FilePotentialConfig>,
    pub lbfgs: Option<FileLbfgsConfig>,
    pub quench: Option<FileQuenchConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
