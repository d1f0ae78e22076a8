//! 类型层错误定义

use crate::topology::{BodyType, JointName};
use thiserror::Error;

/// 名称解析与拓扑校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// 既不是关节也不是链
    #[error("Unknown joint or chain name: '{0}'")]
    UnknownName(String),

    /// 关节在当前机型上不存在
    #[error("Joint {joint} is not available on body type {body_type}")]
    Unavailable {
        /// 关节
        joint: JointName,
        /// 机型
        body_type: BodyType,
    },

    /// 未知的预定义姿态
    #[error("Unknown posture: '{0}'")]
    UnknownPosture(String),

    /// 未知机型
    #[error("Unknown body type: '{0}'")]
    UnknownBodyType(String),
}
