pub mod config;
pub mod manager;

pub use config::{
    validate_url, Config, ConfigError, ConfigResult, EndpointConfig, LogLevel, LoggingConfig,
    UiConfig, DEFAULT_ENDPOINT_URL,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 覆盖服务地址的环境变量
pub const ENDPOINT_ENV: &str = "HAQOOQ_ENDPOINT";

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "HAQOOQ_CONFIG";

/// 获取 HaqooqAI 配置目录路径
pub fn haqooq_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".haqooq"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    haqooq_dir().map(|dir| dir.join("config.json"))
}

/// 初始化目录结构
pub async fn init_haqooq_dirs() -> ConfigResult<()> {
    if let Some(dir) = haqooq_dir() {
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::create_dir_all(dir.join("logs")).await?;
    }
    Ok(())
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}
