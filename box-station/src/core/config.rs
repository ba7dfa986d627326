//! 站点配置 - JSON 配置文件
//!
//! # 配置项
//!
//! | 键 | 默认值 | 说明 |
//! |----|--------|------|
//! | template_dir | templates | 模板目录 (.btw 文件存放位置) |
//! | products | [] | 产品种子数据, 可同步到产品表 |
//! | field_mapping | 见 [`default_field_mapping`] | 模板变量名 → 产品属性 |
//! | database | outerbox.db | SQLite 数据库文件 |
//! | template_extension | btw | 模板文件扩展名 |
//! | print_timeout_secs | 60 | 单次打印任务超时(秒) |
//!
//! Relative paths are resolved against the directory holding the config file.
//! A missing or malformed file never fails startup: [`StationConfig::load`]
//! falls back to defaults.

use crate::printing::PrintSettings;
use box_printer::DEFAULT_TEMPLATE_EXTENSION;
use serde::{Deserialize, Deserializer, Serialize};
use shared::models::{ProductField, ProductInput};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file name
pub const CONFIG_FILE: &str = "config_pure.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Label variable names used by the stock carton templates
pub fn default_field_mapping() -> BTreeMap<String, ProductField> {
    [
        ("mingcheng", ProductField::Name),
        ("guige", ProductField::Spec),
        ("xinghao", ProductField::Model),
        ("yanse", ProductField::Color),
        ("SKU", ProductField::Sku),
        ("69", ProductField::Code69),
        ("shuliang", ProductField::Quantity),
        ("zhongliang", ProductField::Weight),
    ]
    .into_iter()
    .map(|(name, field)| (name.to_string(), field))
    .collect()
}

/// Keep the valid entries of `field_mapping` so one typo does not discard the
/// whole file
fn lenient_field_mapping<'de, D>(deserializer: D) -> Result<BTreeMap<String, ProductField>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| match ProductField::deserialize(&value) {
            Ok(field) => Some((name, field)),
            Err(_) => {
                tracing::warn!(variable = %name, value = %value, "Unknown product attribute in field_mapping, skipped");
                None
            }
        })
        .collect())
}

/// 站点配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// 模板目录
    pub template_dir: String,
    /// 产品种子数据
    pub products: Vec<ProductInput>,
    /// 模板变量名 → 产品属性; unknown attributes are dropped with a warning
    #[serde(deserialize_with = "lenient_field_mapping")]
    pub field_mapping: BTreeMap<String, ProductField>,
    /// 数据库文件
    pub database: String,
    /// 模板文件扩展名
    pub template_extension: String,
    /// 单次打印任务超时(秒)
    pub print_timeout_secs: u64,

    /// Directory of the loaded file; relative paths hang off it
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            template_dir: "templates".to_string(),
            products: Vec::new(),
            field_mapping: default_field_mapping(),
            database: "outerbox.db".to_string(),
            template_extension: DEFAULT_TEMPLATE_EXTENSION.to_string(),
            print_timeout_secs: 60,
            base_dir: PathBuf::new(),
        }
    }
}

impl StationConfig {
    /// 从文件加载配置, 失败返回默认
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(ConfigError::Missing(_)) => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults");
                Self::default().with_base_dir(parent_dir(path))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Config unreadable, using defaults");
                Self::default().with_base_dir(parent_dir(path))
            }
        }
    }

    /// Load without fallback, for diagnostics
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.with_base_dir(parent_dir(path)))
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_err)?;
        tracing::info!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// 模板目录 (绝对或相对于配置文件)
    pub fn template_dir(&self) -> PathBuf {
        self.resolve(&self.template_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database)
    }

    pub fn print_settings(&self) -> PrintSettings {
        PrintSettings {
            template_dir: self.template_dir(),
            template_extension: self.template_extension.clone(),
            field_mapping: self.field_mapping.clone(),
            print_timeout: Duration::from_secs(self.print_timeout_secs.max(1)),
        }
    }

    fn resolve(&self, value: &str) -> PathBuf {
        let path = Path::new(value.trim());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        assert!(matches!(StationConfig::try_load(&path), Err(ConfigError::Missing(_))));

        let config = StationConfig::load(&path);
        assert_eq!(config.template_dir, "templates");
        assert!(config.products.is_empty());
        assert_eq!(config.template_dir(), dir.path().join("templates"));
        assert_eq!(config.database_path(), dir.path().join("outerbox.db"));
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(StationConfig::try_load(&path), Err(ConfigError::Parse { .. })));
        let config = StationConfig::load(&path);
        assert_eq!(config.field_mapping, default_field_mapping());
    }

    #[test]
    fn test_partial_file_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{ "products": [ { "name": "Kettle", "code69": "690", "quantity": 6, "template": "carton" } ] }"#,
        )
        .unwrap();

        let config = StationConfig::try_load(&path).unwrap();
        assert_eq!(config.template_dir, "templates");
        assert_eq!(config.products.len(), 1);
        assert_eq!(config.products[0].case_quantity, 6);
        assert_eq!(config.print_timeout_secs, 60);
        assert_eq!(config.field_mapping.get("69"), Some(&ProductField::Code69));
    }

    #[test]
    fn test_unknown_mapping_value_keeps_rest_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{
                "template_dir": "/srv/labels",
                "database": "station.db",
                "field_mapping": { "mingcheng": "name", "price": "cost", "count": 3, "69": "code69" }
            }"#,
        )
        .unwrap();

        let config = StationConfig::try_load(&path).unwrap();
        assert_eq!(config.template_dir, "/srv/labels");
        assert_eq!(config.database, "station.db");
        assert_eq!(
            config.field_mapping,
            BTreeMap::from([
                ("69".to_string(), ProductField::Code69),
                ("mingcheng".to_string(), ProductField::Name),
            ])
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join(CONFIG_FILE);

        let mut config = StationConfig::default();
        config.template_dir = "/srv/labels".to_string();
        config.field_mapping = BTreeMap::from([("NAME".to_string(), ProductField::Name)]);
        config.save(&path).unwrap();

        let loaded = StationConfig::try_load(&path).unwrap();
        assert_eq!(loaded.template_dir(), PathBuf::from("/srv/labels"));
        assert_eq!(loaded.field_mapping.len(), 1);
    }

    #[test]
    fn test_print_settings() {
        let mut config = StationConfig::default().with_base_dir("/opt/station");
        config.print_timeout_secs = 0;

        let settings = config.print_settings();
        assert_eq!(settings.template_dir, PathBuf::from("/opt/station/templates"));
        assert_eq!(settings.template_extension, "btw");
        assert_eq!(settings.print_timeout, Duration::from_secs(1));
    }
}
