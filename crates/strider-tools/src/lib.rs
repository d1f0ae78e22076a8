//! # Strider Tools - 共享配置结构
//!
//! **依赖原则**: 只依赖 `strider-types`，避免依赖 `strider-motion`
//!
//! ## 包含模块
//!
//! - `config` - 导航配置（机型、默认速度、路径跟随策略）

pub mod config;

pub use config::{ConfigError, NavigationConfig, PathSettings, SpeedSettings};
