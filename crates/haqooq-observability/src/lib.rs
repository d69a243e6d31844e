//! HaqooqAI 日志基础设施
//!
//! 提供统一的 tracing 初始化。

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::{ObservabilityError, Result};
pub use logging::{request_span, LogManager, LogSink};
