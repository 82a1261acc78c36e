use eyre::{eyre, Context, Result};
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::unified::{CacheGeometry, GeometryError, TagMatch};

/// the shape of one cache as given by the user: size in KB, ways, line size in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    pub size_kb: u64,
    pub associativity: u64,
    pub line_size: u64,
    #[serde(default)]
    pub tag_match: TagMatch,
}

impl CacheConfig {
    pub fn new(size_kb: u64, associativity: u64, line_size: u64) -> Self {
        Self {
            size_kb,
            associativity,
            line_size,
            tag_match: TagMatch::default(),
        }
    }

    pub fn geometry(&self) -> Result<CacheGeometry, GeometryError> {
        CacheGeometry::from_kb(self.size_kb, self.associativity, self.line_size)
    }
}

/// the config for one simulation run
///
/// only the unified cache is simulated, `icache`/`dcache` are parsed so a
/// split setup can be reported as unsupported.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub trace_file: Option<PathBuf>,
    pub stat_output: Option<PathBuf>,
    pub unified: Option<CacheConfig>,
    pub icache: Option<CacheConfig>,
    pub dcache: Option<CacheConfig>,
}

impl Config {
    pub fn from_config_file(config_file: &str) -> Result<Config> {
        let config_file = fs::read_to_string(config_file).wrap_err("cannot read config file")?;
        let config: Config =
            toml::from_str(&config_file).wrap_err("cannot deserialize to Config")?;
        Ok(config)
    }

    /// the unified cache and trace path, or why the run cannot start
    pub fn unified_run(&self) -> Result<(CacheConfig, PathBuf)> {
        if self.icache.is_some() || self.dcache.is_some() {
            return Err(eyre!(
                "separate I- and D-caches are not supported, use a unified cache"
            ));
        }
        let unified = self.unified.ok_or_else(|| eyre!("no unified cache configured"))?;
        let trace_file = self
            .trace_file
            .clone()
            .ok_or_else(|| eyre!("no trace file given"))?;
        Ok((unified, trace_file))
    }

    pub fn show_config(&self) -> Result<String> {
        serde_json::to_string_pretty(self).wrap_err("cannot serialize config")
    }
}
