use crate::config::{validate_url, Config, ConfigError, ConfigResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// 配置管理器
#[derive(Clone)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// 加载配置文件，不存在时写入默认配置
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            info!("Loading config from {:?}", path);
            let content = tokio::fs::read_to_string(path).await?;
            let content = Self::expand_env_vars(&content)?;
            let config: Config = serde_json::from_str(&content)?;
            Self::validate(&config)?;
            config
        } else {
            info!("Config file not found, creating default config at {:?}", path);
            let default_config = Config::default();
            // 确保父目录存在
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string_pretty(&default_config)?;
            tokio::fs::write(path, &content).await?;
            default_config
        };

        Ok(Self {
            path: path.to_path_buf(),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 从默认位置加载配置
    pub async fn load_default() -> ConfigResult<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path).await
    }

    /// 获取默认配置路径 (~/.haqooq/config.json)
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        crate::default_config_path()
            .ok_or_else(|| ConfigError::InvalidPath("Could not find home directory".to_string()))
    }

    /// 创建一个新的配置管理器（不读文件）
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 当前配置的副本
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    /// 保存配置到文件
    pub async fn save(&self) -> ConfigResult<()> {
        self.save_to(&self.path).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    /// 保存配置到指定路径
    pub async fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config = self.config.read().await;
        let content = serde_json::to_string_pretty(&*config)?;
        drop(config);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// 更新配置并保存。闭包返回错误时不做任何修改。
    ///
    /// 只把改动的字段写回文件，未改动的 `${VAR}` 占位符保持原样。
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config) -> ConfigResult<()>,
    {
        let mut config = self.config.write().await;
        let mut candidate = config.clone();
        f(&mut candidate)?;
        Self::validate(&candidate)?;

        let before = serde_json::to_value(&*config)?;
        let after = serde_json::to_value(&candidate)?;
        *config = candidate;
        drop(config);

        let mut raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|_| before.clone()),
            Err(_) => before.clone(),
        };
        merge_changes(&mut raw, &before, &after);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_string_pretty(&raw)?).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    /// 验证配置
    pub fn validate(config: &Config) -> ConfigResult<()> {
        validate_url(&config.endpoint.url)?;

        if config.ui.tick_rate_ms == 0 {
            return Err(ConfigError::Validation(
                "ui.tick_rate_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// 展开环境变量 ${VAR} 或 ${VAR:-default}
    fn expand_env_vars(content: &str) -> ConfigResult<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_expr = &cap[1];

            // 处理 ${VAR:-default} 语法
            let (var_name, default_value) = match var_expr.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (var_expr, None),
            };

            let replacement = match std::env::var(var_name) {
                Ok(val) => val,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    None => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
                },
            };

            result = result.replace(full_match, &replacement);
        }

        Ok(result)
    }

    /// 获取配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 把 `before` -> `after` 之间变化的叶子写入 `raw`
fn merge_changes(raw: &mut Value, before: &Value, after: &Value) {
    let Some(after_map) = after.as_object() else {
        *raw = after.clone();
        return;
    };
    if !raw.is_object() {
        *raw = Value::Object(Map::new());
    }
    let Some(raw_map) = raw.as_object_mut() else {
        return;
    };

    for (key, new_value) in after_map {
        let old_value = before.get(key).unwrap_or(&Value::Null);
        if old_value == new_value {
            continue;
        }
        match raw_map.get_mut(key) {
            Some(slot) if new_value.is_object() && slot.is_object() => {
                merge_changes(slot, old_value, new_value)
            }
            _ => {
                raw_map.insert(key.clone(), new_value.clone());
            }
        }
    }
}
