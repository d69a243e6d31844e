//! 观测性错误类型

/// 观测性错误类型
#[derive(Debug, thiserror::Error, Clone)]
pub enum ObservabilityError {
    /// 日志错误
    #[error("Logging error: {message}")]
    Logging { message: String },

    /// IO 错误
    #[error("IO error: {message}")]
    Io { message: String },
}

impl ObservabilityError {
    /// 创建日志错误
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ObservabilityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ObservabilityError>;
