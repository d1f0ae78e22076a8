//! # Strider Motion
//!
//! 人形机器人运动仲裁层：
//!
//! - `arbiter` - 命令校验与下发，所有运动请求的唯一入口
//! - `tracker` - 每个执行槽的状态机（Idle / Blocking / Background）
//! - `path` - 路点序列跟随与障碍物中止
//! - `session` - 单台机器人的会话（配置 + 仲裁器 + 协作方）
//! - `interfaces` - 执行器、定位、障碍物、运动学接口
//! - `sim` - 进程内模拟机器人
//!
//! ## 线程模型
//!
//! 每个会话一个逻辑控制线程。阻塞命令只阻塞调用线程，不影响其他执行槽；
//! 仲裁器不设超时，唯一的取消方式是 `move_stop`。

pub mod arbiter;
pub mod command;
pub mod error;
pub mod interfaces;
pub mod path;
pub mod session;
pub mod sim;
pub mod tracker;

pub use arbiter::CommandArbiter;
pub use command::{
    ActuationIntent, CommandKind, Dispatch, DispatchStatus, ExecutionSlot, MotionCommand,
    VelocityCommand, VelocityMode,
};
pub use error::{MotionError, Result};
pub use interfaces::{Actuation, Completion, CompletionSender, Kinematics, Localization, ObstacleSignal};
pub use path::{PathFollower, PathOutcome};
pub use session::{Collaborators, Outcome, Session};
pub use tracker::{ExecutionTracker, SlotState, Ticket, TrackerSnapshot};
