//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use strider_sdk::prelude::*;
//! ```

// 门面（推荐使用）
pub use crate::Navigation;

// 会话与命令
pub use strider_motion::{
    Collaborators, CommandKind, Dispatch, DispatchStatus, ExecutionSlot, MotionCommand,
    Outcome, PathOutcome, Session, SlotState, TrackerSnapshot,
};

// 协作方接口
pub use strider_motion::{Actuation, Completion, Kinematics, Localization, ObstacleSignal};

// 类型系统
pub use strider_types::{
    BodyType, Chain, Frame, JointName, Pose, PoseStamped, Posture, Rad, Space, SpeedFraction,
};

// 配置
pub use strider_tools::NavigationConfig;

// 错误类型
pub use strider_motion::MotionError;
pub use strider_tools::ConfigError;
