//! 运动层错误类型
//!
//! 错误分为两类：
//!
//! - **校验错误**：在接触执行器之前于本地检测，命令不会被部分执行
//!   （`UnsupportedJoint`、`UnsafePosture`、`UnknownPosture`、`InvalidPath`、
//!   `InvalidArgument`、`UnsupportedMotionMode`）
//! - **协作方错误**：来自执行器/定位/运动学模块，原样向上传播
//!   （`CommunicationError`、`ActuationFailure`、`LocalizationUnavailable`）
//!
//! `Busy` 由执行跟踪器在本地检测。

use crate::command::{CommandKind, ExecutionSlot, VelocityMode};
use strider_types::{Posture, TopologyError};
use thiserror::Error;

/// 运动控制错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// 关节或链在当前机型上不存在
    #[error("Unsupported joint: {0}")]
    UnsupportedJoint(String),

    /// 姿态不允许卸力
    #[error("Posture {0} is not safe for rest")]
    UnsafePosture(Posture),

    /// 未知的姿态名称
    #[error("Unknown posture: '{0}'")]
    UnknownPosture(String),

    /// 速度指令形式与底盘能力不匹配
    #[error("Unsupported motion mode: {requested} velocity on a {base} base")]
    UnsupportedMotionMode {
        /// 调用方使用的形式
        requested: VelocityMode,
        /// 底盘实际支持的形式
        base: VelocityMode,
    },

    /// 执行槽正忙
    #[error("Execution slot {slot} is busy with {active}")]
    Busy {
        /// 冲突的执行槽
        slot: ExecutionSlot,
        /// 正在执行的命令类型
        active: CommandKind,
    },

    /// 路径无效（如空路径）
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// 定位模块未初始化
    #[error("Localization unavailable")]
    LocalizationUnavailable,

    /// 协作方不可达
    #[error("Communication error: {0}")]
    CommunicationError(String),

    /// 硬件拒绝或未能完成运动
    #[error("Actuation failure: {0}")]
    ActuationFailure(String),

    /// 参数无效
    #[error("Invalid argument '{param}': {reason}")]
    InvalidArgument {
        /// 参数名
        param: &'static str,
        /// 原因
        reason: String,
    },
}

impl MotionError {
    /// 是否为本地校验错误（未接触执行器）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedJoint(_)
                | Self::UnsafePosture(_)
                | Self::UnknownPosture(_)
                | Self::UnsupportedMotionMode { .. }
                | Self::InvalidPath(_)
                | Self::InvalidArgument { .. }
        )
    }

    /// 是否来自协作方
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::CommunicationError(_) | Self::ActuationFailure(_) | Self::LocalizationUnavailable
        )
    }

    /// 是否为执行槽冲突
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// 创建通信错误
    pub fn communication(msg: impl Into<String>) -> Self {
        Self::CommunicationError(msg.into())
    }

    /// 创建执行失败错误
    pub fn actuation(msg: impl Into<String>) -> Self {
        Self::ActuationFailure(msg.into())
    }

    /// 创建参数错误
    pub fn invalid_argument(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            reason: reason.into(),
        }
    }
}

impl From<TopologyError> for MotionError {
    fn from(err: TopologyError) -> Self {
        match err {
            TopologyError::UnknownName(name) => Self::UnsupportedJoint(name),
            TopologyError::Unavailable { joint, .. } => Self::UnsupportedJoint(joint.to_string()),
            TopologyError::UnknownPosture(name) => Self::UnknownPosture(name),
            TopologyError::UnknownBodyType(name) => Self::invalid_argument("body_type", name),
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MotionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use strider_types::{BodyType, JointName};

    #[test]
    fn test_error_classification() {
        assert!(MotionError::UnsupportedJoint("LHand".into()).is_validation());
        assert!(MotionError::UnsafePosture(Posture::Stand).is_validation());
        assert!(MotionError::InvalidPath("empty".into()).is_validation());
        assert!(!MotionError::InvalidPath("empty".into()).is_collaborator());

        assert!(MotionError::communication("link down").is_collaborator());
        assert!(MotionError::actuation("fall detected").is_collaborator());
        assert!(MotionError::LocalizationUnavailable.is_collaborator());

        let busy = MotionError::Busy {
            slot: ExecutionSlot::Arms,
            active: CommandKind::ArmPoint,
        };
        assert!(busy.is_busy());
        assert!(!busy.is_validation());
        assert!(!busy.is_collaborator());
    }

    #[test]
    fn test_from_topology_error() {
        let err: MotionError = TopologyError::Unavailable {
            joint: JointName::RWristYaw,
            body_type: BodyType::H21,
        }
        .into();
        assert_eq!(err, MotionError::UnsupportedJoint("RWristYaw".into()));

        let err: MotionError = TopologyError::UnknownPosture("Dance".into()).into();
        assert_eq!(err, MotionError::UnknownPosture("Dance".into()));
    }

    #[test]
    fn test_error_display() {
        let err = MotionError::Busy {
            slot: ExecutionSlot::Locomotion,
            active: CommandKind::GoalPose,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Locomotion") && msg.contains("GoalPose"));

        let err = MotionError::UnsupportedMotionMode {
            requested: VelocityMode::Holonomic,
            base: VelocityMode::NonHolonomic,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("holonomic") && msg.contains("non-holonomic"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MotionError>();
    }
}
