use serde_derive::Deserialize;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use thiserror::*;

/// Names the YAML file to load; defaults apply when it is unset.
pub const CONFIG_ENV: &str = "TASKLIST_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error {0} when reading config")]
    IoError(#[from] std::io::Error),
    #[error("cannot open config file '{0}' : {1}")]
    OpeningError(PathBuf, std::io::Error),
    #[error("UTF8 format error when reading config")]
    Utf8Error,
    #[error("format error {0} when reading config")]
    FormatError(#[from] serde_yaml::Error),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Listen {
    pub host: Option<IpAddr>,
    pub port: u16,
}

impl Listen {
    pub fn host(&self) -> IpAddr {
        self.host.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

impl Default for Listen {
    fn default() -> Self {
        Self {
            host: None,
            port: 8080,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory,
    Sqlite { path: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory
    }
}

#[derive(Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listen: Listen,
    #[serde(default)]
    pub storage: StorageConfig,
    pub log: Option<crate::log::Log>,
}

impl Config {
    pub fn from_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let p = path.as_ref();
        let mut file = File::open(p).map_err(|e| ConfigError::OpeningError(p.to_owned(), e))?;
        let mut contents = vec![];
        file.read_to_end(&mut contents)?;
        let contents = String::from_utf8(contents).map_err(|_| ConfigError::Utf8Error)?;
        let config = Config::from_str(&contents)?;
        Ok(config)
    }

    /// Loads the file named by `TASKLIST_CONFIG`, or the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Config::from_file(path),
            None => Ok(Config::default()),
        }
    }
}
