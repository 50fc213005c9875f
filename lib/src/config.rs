// lib/src/config.rs

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use models::errors::{ClinicError, ClinicResult};

/// Looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "clinic.toml";
/// Environment overrides use this prefix with `__` between sections,
/// e.g. `CLINIC__PRACTICE__DOCTOR_NAME`.
pub const ENV_PREFIX: &str = "CLINIC";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Doctor and clinic details printed in the prescription header and signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeConfig {
    pub doctor_name: String,
    pub qualifications: String,
    pub registration_number: String,
    pub clinic_name: String,
    pub address: String,
    pub phone: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        PracticeConfig {
            doctor_name: "Dr. Anita Kulkarni".to_string(),
            qualifications: "MBBS, MD (General Medicine)".to_string(),
            registration_number: "KMC-48213".to_string(),
            clinic_name: "Sunrise Family Clinic".to_string(),
            address: "2nd Floor, 41 MG Road, Bengaluru 560001".to_string(),
            phone: "+91 80 4123 5678".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    pub currency_symbol: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig { currency_symbol: "₹".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory with replacement seed files. The embedded sample is used when unset.
    pub seed_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicConfig {
    pub log_level: String,
    pub practice: PracticeConfig,
    pub billing: BillingConfig,
    pub data: DataConfig,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        ClinicConfig {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            practice: PracticeConfig::default(),
            billing: BillingConfig::default(),
            data: DataConfig::default(),
        }
    }
}

fn config_error(err: config::ConfigError) -> ClinicError {
    ClinicError::ConfigurationError(err.to_string())
}

/// The TOML file [`load_clinic_config`] reads: `path` when given, otherwise
/// `clinic.toml` if it exists in the working directory.
pub fn config_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            default.exists().then(|| default.to_path_buf())
        }
    }
}

/// Loads configuration from built-in defaults, then the TOML file, then
/// `CLINIC__*` environment variables.
///
/// An explicit `path` must exist.
pub fn load_clinic_config(path: Option<&Path>) -> ClinicResult<ClinicConfig> {
    let defaults = Config::try_from(&ClinicConfig::default()).map_err(config_error)?;
    let mut builder = Config::builder().add_source(defaults);

    if let Some(file) = config_file(path) {
        builder = builder.add_source(File::from(file.as_path()).required(true));
    }

    builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .and_then(|config| config.try_deserialize::<ClinicConfig>())
        .map_err(config_error)
}
