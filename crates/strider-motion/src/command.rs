//! 运动命令与执行意图
//!
//! - [`MotionCommand`]：调用方提交的原始请求（名称未解析、速度未截断）
//! - [`ActuationIntent`]：仲裁器校验后交给执行器的意图（类型化、已应用耦合规则）
//! - [`ExecutionSlot`]：独立的执行资源（底盘、手臂、头部）

use smallvec::SmallVec;
use std::fmt;
use strider_types::nalgebra::Point3;
use strider_types::{Chain, Frame, JointTarget, Pose, PoseStamped, Posture, SpeedFraction};

/// 执行槽
///
/// 每个槽同一时刻至多执行一条命令。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExecutionSlot {
    /// 行走（速度、目标位姿、腿部关节）
    Locomotion,
    /// 手臂（手臂关节、指向）
    Arms,
    /// 头部（头部关节、注视）
    Head,
}

impl ExecutionSlot {
    /// 所有执行槽
    pub const ALL: [ExecutionSlot; 3] =
        [ExecutionSlot::Locomotion, ExecutionSlot::Arms, ExecutionSlot::Head];

    /// 槽在跟踪表中的下标
    pub(crate) const fn index(self) -> usize {
        match self {
            ExecutionSlot::Locomotion => 0,
            ExecutionSlot::Arms => 1,
            ExecutionSlot::Head => 2,
        }
    }

    /// 关节链对应的执行槽
    pub const fn for_chain(chain: Chain) -> Self {
        match chain {
            Chain::Head => ExecutionSlot::Head,
            Chain::LArm | Chain::RArm => ExecutionSlot::Arms,
            Chain::LLeg | Chain::RLeg => ExecutionSlot::Locomotion,
        }
    }
}

impl fmt::Display for ExecutionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionSlot::Locomotion => write!(f, "Locomotion"),
            ExecutionSlot::Arms => write!(f, "Arms"),
            ExecutionSlot::Head => write!(f, "Head"),
        }
    }
}

/// 一次请求触及的执行槽（有序、去重）
pub type SlotSet = SmallVec<[ExecutionSlot; 3]>;

/// 所有执行槽组成的集合
pub fn all_slots() -> SlotSet {
    SmallVec::from_slice(&ExecutionSlot::ALL)
}

/// 从关节目标推导执行槽
pub fn slots_for_targets(targets: &[JointTarget]) -> SlotSet {
    let mut slots = SlotSet::new();
    for target in targets {
        let slot = ExecutionSlot::for_chain(target.joint.chain());
        if !slots.contains(&slot) {
            slots.push(slot);
        }
    }
    slots.sort();
    slots
}

/// 命令类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Velocity,
    GoalPose,
    JointTarget,
    Posture,
    Rest,
    GazePoint,
    ArmPoint,
    FollowPath,
}

impl CommandKind {
    /// 命令是否阻塞调用方直到完成
    pub const fn is_blocking(self) -> bool {
        !matches!(self, CommandKind::Velocity)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Velocity => "Velocity",
            CommandKind::GoalPose => "GoalPose",
            CommandKind::JointTarget => "JointTarget",
            CommandKind::Posture => "Posture",
            CommandKind::Rest => "Rest",
            CommandKind::GazePoint => "GazePoint",
            CommandKind::ArmPoint => "ArmPoint",
            CommandKind::FollowPath => "FollowPath",
        };
        write!(f, "{}", name)
    }
}

/// 速度指令形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityMode {
    /// 全向底盘（x, y, theta）
    Holonomic,
    /// 非全向底盘（x, theta）
    NonHolonomic,
}

impl VelocityMode {
    /// 底盘能力对应的速度形式
    pub const fn for_base(holonomic_capable: bool) -> Self {
        if holonomic_capable {
            VelocityMode::Holonomic
        } else {
            VelocityMode::NonHolonomic
        }
    }
}

impl fmt::Display for VelocityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VelocityMode::Holonomic => write!(f, "holonomic"),
            VelocityMode::NonHolonomic => write!(f, "non-holonomic"),
        }
    }
}

/// 速度指令（归一化到 [-1, 1]，由执行器解释）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityCommand {
    /// 全向形式
    Holonomic { x: f64, y: f64, theta: f64 },
    /// 非全向形式
    NonHolonomic { x: f64, theta: f64 },
}

impl VelocityCommand {
    /// 指令形式
    pub const fn mode(&self) -> VelocityMode {
        match self {
            VelocityCommand::Holonomic { .. } => VelocityMode::Holonomic,
            VelocityCommand::NonHolonomic { .. } => VelocityMode::NonHolonomic,
        }
    }

    /// 分量是否全部有限
    pub fn is_finite(&self) -> bool {
        match *self {
            VelocityCommand::Holonomic { x, y, theta } => {
                x.is_finite() && y.is_finite() && theta.is_finite()
            },
            VelocityCommand::NonHolonomic { x, theta } => x.is_finite() && theta.is_finite(),
        }
    }
}

/// 调用方提交的运动请求
///
/// 名称与速度保持原样，由 [`CommandArbiter`](crate::CommandArbiter) 统一校验。
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    /// 速度控制（非阻塞）
    Velocity(VelocityCommand),
    /// 移动到目标位姿
    GoalPose { pose: Pose, frame: Frame },
    /// 关节目标；`speed` 为 `None` 时使用配置的默认速度
    Joints {
        names: Vec<String>,
        angles: Vec<f64>,
        speed: Option<f64>,
    },
    /// 预定义姿态（未指定速度时使用配置的默认速度）
    Posture { name: String, speed: Option<f64> },
    /// 卸力到指定姿态
    Rest { name: String },
    /// 头部注视机器人坐标系中的点
    GazePoint { target: Point3<f64> },
    /// 手臂指向机器人坐标系中的点
    ArmPoint { target: Point3<f64> },
    /// 沿路点序列行走
    FollowPath(Vec<PoseStamped>),
}

impl MotionCommand {
    /// 全向速度指令
    pub fn velocity(x: f64, y: f64, theta: f64) -> Self {
        MotionCommand::Velocity(VelocityCommand::Holonomic { x, y, theta })
    }

    /// 非全向速度指令
    pub fn velocity_nonholonomic(x: f64, theta: f64) -> Self {
        MotionCommand::Velocity(VelocityCommand::NonHolonomic { x, theta })
    }

    /// 关节指令
    pub fn joints<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        angles: impl IntoIterator<Item = f64>,
        speed: Option<f64>,
    ) -> Self {
        MotionCommand::Joints {
            names: names.into_iter().map(Into::into).collect(),
            angles: angles.into_iter().collect(),
            speed,
        }
    }

    /// 命令类型
    pub fn kind(&self) -> CommandKind {
        match self {
            MotionCommand::Velocity(_) => CommandKind::Velocity,
            MotionCommand::GoalPose { .. } => CommandKind::GoalPose,
            MotionCommand::Joints { .. } => CommandKind::JointTarget,
            MotionCommand::Posture { .. } => CommandKind::Posture,
            MotionCommand::Rest { .. } => CommandKind::Rest,
            MotionCommand::GazePoint { .. } => CommandKind::GazePoint,
            MotionCommand::ArmPoint { .. } => CommandKind::ArmPoint,
            MotionCommand::FollowPath(_) => CommandKind::FollowPath,
        }
    }
}

/// 单链规模的关节目标缓冲
pub type JointTargets = SmallVec<[JointTarget; 6]>;

/// 交给执行器的意图
#[derive(Debug, Clone, PartialEq)]
pub enum ActuationIntent {
    Velocity(VelocityCommand),
    GoalPose { pose: Pose, frame: Frame },
    Joints { targets: JointTargets },
    Posture { posture: Posture, speed: SpeedFraction },
    Rest { posture: Posture, speed: SpeedFraction },
    LookAt { target: Point3<f64>, speed: SpeedFraction },
    PointArm { chain: Chain, target: Point3<f64>, speed: SpeedFraction },
}

impl ActuationIntent {
    /// 意图类型
    pub fn kind(&self) -> CommandKind {
        match self {
            ActuationIntent::Velocity(_) => CommandKind::Velocity,
            ActuationIntent::GoalPose { .. } => CommandKind::GoalPose,
            ActuationIntent::Joints { .. } => CommandKind::JointTarget,
            ActuationIntent::Posture { .. } => CommandKind::Posture,
            ActuationIntent::Rest { .. } => CommandKind::Rest,
            ActuationIntent::LookAt { .. } => CommandKind::GazePoint,
            ActuationIntent::PointArm { .. } => CommandKind::ArmPoint,
        }
    }

    /// 意图占用的执行槽
    pub fn slots(&self) -> SlotSet {
        match self {
            ActuationIntent::Velocity(_) | ActuationIntent::GoalPose { .. } => {
                SmallVec::from_slice(&[ExecutionSlot::Locomotion])
            },
            ActuationIntent::Joints { targets } => slots_for_targets(targets),
            ActuationIntent::Posture { .. } | ActuationIntent::Rest { .. } => all_slots(),
            ActuationIntent::LookAt { .. } => SmallVec::from_slice(&[ExecutionSlot::Head]),
            ActuationIntent::PointArm { .. } => SmallVec::from_slice(&[ExecutionSlot::Arms]),
        }
    }
}

/// 仲裁结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// 阻塞命令已完成
    Completed,
    /// 非阻塞命令已开始在后台执行
    Started,
    /// 速度为 0，未执行任何动作
    Skipped,
}

/// 一次成功提交的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub kind: CommandKind,
    pub status: DispatchStatus,
}

impl Dispatch {
    pub(crate) fn new(kind: CommandKind, status: DispatchStatus) -> Self {
        Dispatch { kind, status }
    }
}
