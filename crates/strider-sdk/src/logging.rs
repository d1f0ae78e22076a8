//! 日志初始化
//!
//! 库代码统一使用 `tracing` 宏。应用在启动时调用一次 [`init_logger`]：
//!
//! ```rust
//! strider_sdk::logging::init_logger();
//! // 第二次调用被忽略
//! assert!(!strider_sdk::logging::init_logger());
//! ```
//!
//! 过滤规则来自 `RUST_LOG`，并默认追加 `strider=info`。
//! 依赖 `log` 的第三方库输出经 `tracing_log::LogTracer` 转发。

use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, ParseError};

/// 默认追加的过滤指令
pub const DEFAULT_DIRECTIVE: &str = "strider=info";

/// 安装全局日志订阅者
///
/// 返回本次调用是否完成了安装（已安装过时返回 `false`）。
pub fn init_logger() -> bool {
    let filter = EnvFilter::from_default_env();
    let filter = match DEFAULT_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    install(filter)
}

/// 使用显式过滤规则安装全局日志订阅者（忽略 `RUST_LOG`）
///
/// # 错误
///
/// 过滤规则无法解析时返回 `ParseError`，不安装任何订阅者。
pub fn init_logger_with_filter(filter: &str) -> Result<bool, ParseError> {
    let filter = EnvFilter::try_new(filter)?;
    Ok(install(filter))
}

fn install(filter: EnvFilter) -> bool {
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    // 其他组件可能已经注册了 log 后端
    let _ = LogTracer::init_with_filter(log::LevelFilter::Trace);
    true
}
