use serde::{Deserialize, Serialize};

/// 默认问答服务地址
pub const DEFAULT_ENDPOINT_URL: &str = "https://ary91-haqooqai-backend.hf.space/ask/";

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoint: EndpointConfig::default(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["endpoint", "url"] => Some(self.endpoint.url.clone()),
            ["ui", "title"] => Some(self.ui.title.clone()),
            ["ui", "subtitle"] => Some(self.ui.subtitle.clone()),
            ["ui", "greeting"] => Some(self.ui.greeting.clone()),
            ["ui", "tick_rate_ms"] => Some(self.ui.tick_rate_ms.to_string()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["endpoint", "url"] => {
                validate_url(value)?;
                self.endpoint.url = value.to_string();
            }
            ["ui", "title"] => {
                self.ui.title = value.to_string();
            }
            ["ui", "subtitle"] => {
                self.ui.subtitle = value.to_string();
            }
            ["ui", "greeting"] => {
                self.ui.greeting = value.to_string();
            }
            ["ui", "tick_rate_ms"] => {
                let rate: u64 = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid number: {}", value))
                })?;
                if rate == 0 {
                    return Err(ConfigError::Validation(
                        "ui.tick_rate_ms must be greater than 0".to_string(),
                    ));
                }
                self.ui.tick_rate_ms = rate;
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }

    /// 用命令行或环境变量覆盖服务地址
    pub fn with_endpoint_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.endpoint.url = url;
        }
        self
    }
}

/// 检查服务地址是否为 http(s) URL
pub fn validate_url(url: &str) -> ConfigResult<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "Endpoint must be an http(s) URL: {}",
            url
        ))),
    }
}

/// 问答服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    pub url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT_URL.to_string(),
        }
    }
}

/// 界面配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    pub title: String,
    pub subtitle: String,
    /// 会话开始时显示的欢迎语（不计入消息列表）
    pub greeting: String,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

fn default_tick_rate() -> u64 {
    100
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "HaqooqAI".to_string(),
            subtitle: "Your AI Legal Assistant".to_string(),
            greeting: "Hello! I'm HaqooqAI, your AI-powered legal assistant for Pakistani law. How can I help you today?".to_string(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// 日志文件；终端界面运行时日志只写入文件
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.haqooq/logs/haqooq.log".to_string()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
