//! # 导航配置
//!
//! 机型、默认速度和路径跟随策略。
//!
//! ```toml
//! body_type = "H21"
//!
//! [speeds]
//! default_joint = 0.2
//! posture = 0.6
//! rest = 0.5
//! pointing = 0.4
//! gaze = 0.3
//!
//! [path]
//! check_obstacle_after_last = true
//! ```
//!
//! 缺省的字段使用 [`NavigationConfig::default`] 中的值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use strider_types::{BodyType, JointTopology, SpeedFraction};
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读写失败
    #[error("Config IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML 解析失败
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 字段值无效
    #[error("Invalid config field '{field}': {reason}")]
    Invalid {
        /// 字段名
        field: &'static str,
        /// 原因
        reason: String,
    },
}

/// 导航配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// 机型（决定关节可用性）
    pub body_type: BodyType,

    /// 默认速度
    pub speeds: SpeedSettings,

    /// 路径跟随
    pub path: PathSettings,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            body_type: BodyType::H25,
            speeds: SpeedSettings::default(),
            path: PathSettings::default(),
        }
    }
}

impl NavigationConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NavigationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 校验所有字段
    ///
    /// 速度比例必须位于 `(0, 1]`：配置为 0 会让对应命令永远不运动。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let speeds = [
            ("speeds.default_joint", self.speeds.default_joint),
            ("speeds.posture", self.speeds.posture),
            ("speeds.rest", self.speeds.rest),
            ("speeds.pointing", self.speeds.pointing),
            ("speeds.gaze", self.speeds.gaze),
        ];
        for (field, value) in speeds {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("speed fraction must be in (0, 1], got {}", value),
                });
            }
        }
        Ok(())
    }

    /// 当前机型的关节拓扑
    pub fn topology(&self) -> JointTopology {
        JointTopology::new(self.body_type)
    }
}

/// 默认速度（最大速度的比例）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedSettings {
    /// 未指定速度的关节命令
    pub default_joint: f64,

    /// 未指定速度的预定义姿态
    pub posture: f64,

    /// 卸力前进入安全姿态
    pub rest: f64,

    /// 手臂指向
    pub pointing: f64,

    /// 头部注视
    pub gaze: f64,
}

impl SpeedSettings {
    /// 未指定速度的关节命令
    pub fn default_joint(&self) -> SpeedFraction {
        SpeedFraction::new(self.default_joint)
    }

    /// 预定义姿态
    pub fn posture(&self) -> SpeedFraction {
        SpeedFraction::new(self.posture)
    }

    /// 卸力
    pub fn rest(&self) -> SpeedFraction {
        SpeedFraction::new(self.rest)
    }

    /// 手臂指向
    pub fn pointing(&self) -> SpeedFraction {
        SpeedFraction::new(self.pointing)
    }

    /// 头部注视
    pub fn gaze(&self) -> SpeedFraction {
        SpeedFraction::new(self.gaze)
    }
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            default_joint: 0.2,
            posture: 0.6,
            rest: 0.5,
            pointing: 0.4,
            gaze: 0.3,
        }
    }
}

/// 路径跟随设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// 到达最后一个路点后是否再检查一次障碍物（只记录日志，不影响结果；默认关闭）
    pub check_obstacle_after_last: bool,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            check_obstacle_after_last: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = NavigationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.body_type, BodyType::H25);
        assert!(!config.path.check_obstacle_after_last);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = NavigationConfig::from_toml_str(
            r#"
body_type = "H21"

[speeds]
gaze = 0.9
"#,
        )
        .unwrap();

        assert_eq!(config.body_type, BodyType::H21);
        assert_eq!(config.speeds.gaze, 0.9);
        // 未指定的字段使用默认值
        assert_eq!(config.speeds.posture, SpeedSettings::default().posture);
        assert!(!config.path.check_obstacle_after_last);
    }

    #[test]
    fn test_parse_empty_toml_gives_default() {
        let config = NavigationConfig::from_toml_str("").unwrap();
        assert_eq!(config, NavigationConfig::default());
    }

    #[test]
    fn test_reject_zero_speed() {
        let err = NavigationConfig::from_toml_str("[speeds]\nrest = 0.0\n").unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "speeds.rest"),
            other => panic!("Expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_out_of_range_speed() {
        let err = NavigationConfig::from_toml_str("[speeds]\ndefault_joint = 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "speeds.default_joint",
                ..
            }
        ));
    }

    #[test]
    fn test_reject_unknown_body_type() {
        let err = NavigationConfig::from_toml_str("body_type = \"T14\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let mut config = NavigationConfig::default();
        config.body_type = BodyType::H21;
        config.speeds.pointing = 0.75;
        config.path.check_obstacle_after_last = true;

        let file = NamedTempFile::new().unwrap();
        config.save_to_file(file.path()).unwrap();

        let loaded = NavigationConfig::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = NavigationConfig::load_from_file("/nonexistent/strider/navigation.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_topology_follows_body_type() {
        let mut config = NavigationConfig::default();
        config.body_type = BodyType::H21;
        assert_eq!(config.topology().body_type(), BodyType::H21);
    }

    #[test]
    fn test_json_serialization() {
        let config = NavigationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"body_type\":\"H25\""));
    }
}
