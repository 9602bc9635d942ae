// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path, ConfigSource};
use crate::yaml::load_yaml_with_env;
use crate::SigningKey;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use tracing::debug;
use veil_events::Address;

pub const DEFAULT_CONFIG_NAME: &str = "veil.config.yaml";
pub const ENV_PREFIX: &str = "VEIL_";
pub const DEFAULT_MAX_SCORE: u8 = 10;

/// How the simulated disclosure oracle answers decryption requests
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OracleMode {
    /// Fulfil every request as soon as it is observed
    #[default]
    Immediate,
    /// Hold requests until they are fulfilled explicitly
    Manual,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Inclusive upper bound for every score dimension
    pub max_score: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            max_score: DEFAULT_MAX_SCORE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    /// Hex encoded 32 byte key. A development key is used when unset.
    pub signing_key: Option<String>,
    pub mode: OracleMode,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BusConfig {
    pub deduplicate: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { deduplicate: true }
    }
}

/// The configuration as it appears in yaml and the environment, before validation
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UnvalidatedConfig {
    pub administrator: Option<Address>,
    pub scoring: ScoringConfig,
    pub oracle: OracleConfig,
    pub bus: BusConfig,
}

impl UnvalidatedConfig {
    pub fn validate(self, config_file: Option<PathBuf>) -> Result<EngineConfig> {
        let Some(administrator) = self.administrator else {
            bail!("`administrator` is required");
        };
        if administrator.is_zero() {
            bail!("`administrator` must not be the zero address");
        }
        if self.scoring.max_score == 0 {
            bail!("`scoring.max_score` must be between 1 and 255");
        }
        let signing_key = match self.oracle.signing_key.as_deref() {
            Some(key) => key.parse::<SigningKey>()?,
            None => SigningKey::development(),
        };

        Ok(EngineConfig {
            administrator,
            max_score: self.scoring.max_score,
            signing_key,
            oracle_mode: self.oracle.mode,
            deduplicate: self.bus.deduplicate,
            config_file,
        })
    }
}

/// Validated configuration for one engine instance
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    administrator: Address,
    max_score: u8,
    #[serde(skip)]
    signing_key: SigningKey,
    oracle_mode: OracleMode,
    deduplicate: bool,
    config_file: Option<PathBuf>,
}

impl EngineConfig {
    /// Defaults for everything except the administrator
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            max_score: DEFAULT_MAX_SCORE,
            signing_key: SigningKey::development(),
            oracle_mode: OracleMode::default(),
            deduplicate: true,
            config_file: None,
        }
    }

    pub fn with_max_score(mut self, max_score: u8) -> Self {
        self.max_score = max_score;
        self
    }

    pub fn with_oracle_mode(mut self, mode: OracleMode) -> Self {
        self.oracle_mode = mode;
        self
    }

    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = key;
        self
    }

    pub fn administrator(&self) -> Address {
        self.administrator
    }

    pub fn max_score(&self) -> u8 {
        self.max_score
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn oracle_mode(&self) -> OracleMode {
        self.oracle_mode
    }

    pub fn deduplicate(&self) -> bool {
        self.deduplicate
    }

    pub fn config_file(&self) -> Option<&PathBuf> {
        self.config_file.as_ref()
    }
}

pub struct OsDirs;

impl OsDirs {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("veil")
    }
}

/// Load configuration from defaults, then the yaml file, then `VEIL_` prefixed environment
/// variables (`__` separates nested keys, eg. `VEIL_SCORING__MAX_SCORE`).
pub fn load_config(cli_file: Option<String>) -> Result<EngineConfig> {
    let source = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir(),
        DEFAULT_CONFIG_NAME,
        cli_file.map(PathBuf::from),
    );
    debug!("loading configuration from {:?}", source);

    let loaded_yaml = load_yaml_with_env(source.path(), source.is_explicit())
        .with_context(|| format!("Could not read {}", source.path().display()))?;

    let unvalidated: UnvalidatedConfig =
        Figment::from(Serialized::defaults(UnvalidatedConfig::default()))
            .merge(Yaml::string(&loaded_yaml))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Could not parse configuration")?;

    let config_file = source.path().exists().then(|| source.path().to_path_buf());
    unvalidated
        .validate(config_file)
        .context("Invalid configuration")
}
