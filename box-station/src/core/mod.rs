//! 核心模块 - 站点配置
//!
//! - [`StationConfig`] - JSON 配置 (模板目录、字段映射、数据库等)
//! - [`ConfigError`] - 配置读写错误

pub mod config;

pub use config::{CONFIG_FILE, ConfigError, StationConfig, default_field_mapping};
