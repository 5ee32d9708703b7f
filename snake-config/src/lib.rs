mod config;

pub use config::{
    batch_config_from_toml_str, default_batch_config, default_batch_config_path,
    load_batch_config_from_path, validate_batch_config, BatchConfig, MAX_SUPPORTED_BOARD_SIZE,
};
