use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BATCH_CONFIG_REL_PATH: &str = "default.toml";

/// Largest board side that still fits every cell into the 39x39 egocentric window.
pub const MAX_SUPPORTED_BOARD_SIZE: u32 = 19;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_slots")]
    pub slots: usize,
    #[serde(default = "default_models")]
    pub models: usize,
    /// `None` draws a fresh root seed from OS entropy at construction.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_min_board_size")]
    pub min_board_size: u32,
    #[serde(default = "default_max_board_size")]
    pub max_board_size: u32,
    #[serde(default = "default_min_food")]
    pub min_food: u32,
    #[serde(default = "default_max_food")]
    pub max_food: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        default_batch_config()
    }
}

impl BatchConfig {
    pub fn new(threads: usize, slots: usize, models: usize) -> Self {
        Self {
            threads,
            slots,
            models,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub fn batch_config_from_toml_str(raw: &str) -> Result<BatchConfig, toml::de::Error> {
    toml::from_str(raw)
}

pub fn default_batch_config() -> BatchConfig {
    batch_config_from_toml_str(include_str!("../default.toml"))
        .expect("default batch config TOML must deserialize")
}

pub fn default_batch_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_BATCH_CONFIG_REL_PATH)
}

pub fn load_batch_config_from_path(path: &Path) -> Result<BatchConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch config from {}", path.display()))?;
    let config = batch_config_from_toml_str(&raw)
        .context("batch config TOML failed schema deserialization")
        .with_context(|| format!("failed to parse batch config from {}", path.display()))?;
    validate_batch_config(&config)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("invalid batch config in {}", path.display()))?;
    Ok(config)
}

pub fn validate_batch_config(config: &BatchConfig) -> Result<(), String> {
    if config.threads == 0 {
        return Err("threads must be greater than zero".to_owned());
    }
    if config.slots == 0 {
        return Err("slots must be greater than zero".to_owned());
    }
    if config.models == 0 {
        return Err("models must be greater than zero".to_owned());
    }
    if config.min_board_size < 2 {
        return Err("min_board_size must be at least 2".to_owned());
    }
    if config.min_board_size > config.max_board_size {
        return Err("min_board_size must not exceed max_board_size".to_owned());
    }
    if config.max_board_size > MAX_SUPPORTED_BOARD_SIZE {
        return Err(format!("max_board_size must be <= {MAX_SUPPORTED_BOARD_SIZE}"));
    }
    if config.min_food > config.max_food {
        return Err("min_food must not exceed max_food".to_owned());
    }
    let smallest_board = config.min_board_size as usize * config.min_board_size as usize;
    if config.models + config.max_food as usize > smallest_board {
        return Err(format!(
            "models + max_food ({}) must fit on the smallest board ({smallest_board} cells)",
            config.models + config.max_food as usize
        ));
    }
    Ok(())
}

fn default_threads() -> usize {
    4
}

fn default_slots() -> usize {
    16
}

fn default_models() -> usize {
    1
}

fn default_min_board_size() -> u32 {
    7
}

fn default_max_board_size() -> u32 {
    MAX_SUPPORTED_BOARD_SIZE
}

fn default_min_food() -> u32 {
    1
}

fn default_max_food() -> u32 {
    8
}
