//! 结构化日志模块
//!
//! 基于 tracing 的日志初始化。终端界面占用 stdout，所以界面程序写文件，
//! 命令行程序写 stderr。

use std::path::{Path, PathBuf};

use haqooq_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ObservabilityError, Result};

/// 日志输出目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// 标准错误输出
    Stderr,
    /// 追加写入指定文件
    File(PathBuf),
}

impl LogSink {
    /// 根据配置选择输出：有文件路径则写文件，否则写 stderr
    pub fn from_config(config: &LoggingConfig) -> Self {
        match config.file.as_deref().and_then(haqooq_config::expand_tilde) {
            Some(path) => LogSink::File(path),
            None => LogSink::Stderr,
        }
    }
}

/// 日志管理器
///
/// 持有非阻塞写入器的 guard；drop 时刷新剩余日志。
pub struct LogManager {
    sink: LogSink,
    _guard: Option<WorkerGuard>,
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("sink", &self.sink)
            .finish()
    }
}

impl LogManager {
    /// 初始化全局日志系统
    pub fn init(config: &LoggingConfig, sink: LogSink) -> Result<Self> {
        let level = config.level.to_string();
        let filter = build_filter(&level)?;
        let registry = tracing_subscriber::registry().with(filter);

        let guard = match &sink {
            LogSink::Stderr => {
                let layer = tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr);
                registry
                    .with(layer)
                    .try_init()
                    .map_err(|e| ObservabilityError::logging(e.to_string()))?;
                None
            }
            LogSink::File(path) => {
                let (dir, file_name) = split_log_path(path)?;
                std::fs::create_dir_all(&dir)?;
                let appender = tracing_appender::rolling::never(&dir, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(writer);
                registry
                    .with(layer)
                    .try_init()
                    .map_err(|e| ObservabilityError::logging(e.to_string()))?;
                Some(guard)
            }
        };

        tracing::info!(target: "haqooq_observability", log_level = %level, sink = ?sink, "log manager initialized");

        Ok(Self {
            sink,
            _guard: guard,
        })
    }
}

/// 构建过滤器；设置了 RUST_LOG 时以其为准
fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))
}

fn split_log_path(path: &Path) -> Result<(PathBuf, std::ffi::OsString)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ObservabilityError::logging(format!("Log path has no file name: {:?}", path)))?
        .to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

/// 为一次问答请求创建 span
pub fn request_span(token: &str) -> tracing::Span {
    tracing::info_span!("request", token = %token)
}
