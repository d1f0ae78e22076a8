//! CommandArbiter - 运动命令仲裁
//!
//! 所有运动请求的唯一入口。对每条命令：
//!
//! 1. 针对当前机型校验关节/链名称、参数与姿态（原子：失败时不下发任何内容）
//! 2. 应用耦合关节优先级规则
//! 3. 确定占用的执行槽并向 [`ExecutionTracker`] 申请
//! 4. 交给 [`Actuation`] 执行；阻塞命令在完成信号上等待
//!
//! # 阻塞语义
//!
//! ```text
//! submit(GoalPose)
//!   ├─ acquire_blocking([Locomotion])   ← 槽非空闲则 Busy
//!   ├─ actuation.execute(intent)        ← 立即返回 Completion
//!   ├─ completion.wait()                ← 不持有跟踪器锁
//!   └─ guard drop                       ← 成功或失败都回到 Idle
//! ```
//!
//! 速度命令不阻塞，Locomotion 保持 `Background` 直到被新的速度命令替换
//! 或被 [`move_stop`](CommandArbiter::move_stop) 停止。

use crate::command::{
    ActuationIntent, CommandKind, Dispatch, DispatchStatus, ExecutionSlot, JointTargets,
    MotionCommand, VelocityCommand, VelocityMode,
};
use crate::error::{MotionError, Result};
use crate::interfaces::Actuation;
use crate::tracker::{BlockingGuard, ExecutionTracker, SlotState};
use std::sync::Arc;
use strider_tools::SpeedSettings;
use strider_types::nalgebra::Point3;
use strider_types::{
    Chain, Frame, HIP_YAW_PITCH, JointTarget, JointTopology, Pose, Posture, Rad, SpeedFraction,
};
use tracing::{debug, info, trace, warn};

/// 校验后的执行计划
#[derive(Debug)]
enum Plan {
    /// 速度为 0，直接成功
    Skip(CommandKind),
    Blocking(ActuationIntent),
    Background(ActuationIntent),
}

/// 运动命令仲裁器
pub struct CommandArbiter {
    topology: JointTopology,
    speeds: SpeedSettings,
    actuation: Arc<dyn Actuation>,
    tracker: ExecutionTracker,
}

impl CommandArbiter {
    /// 创建仲裁器
    pub fn new(topology: JointTopology, speeds: SpeedSettings, actuation: Arc<dyn Actuation>) -> Self {
        CommandArbiter {
            topology,
            speeds,
            actuation,
            tracker: ExecutionTracker::new(),
        }
    }

    /// 当前机型拓扑
    pub fn topology(&self) -> &JointTopology {
        &self.topology
    }

    /// 执行槽状态（只读）
    pub fn tracker(&self) -> &ExecutionTracker {
        &self.tracker
    }

    /// 提交一条运动命令
    ///
    /// 阻塞命令返回时已到达终止状态；速度命令返回时已开始执行。
    ///
    /// # 错误
    ///
    /// - 校验错误（`UnsupportedJoint`、`UnsafePosture`、`UnknownPosture`、
    ///   `UnsupportedMotionMode`、`InvalidArgument`）：未接触执行器
    /// - `Busy`：目标槽正被占用
    /// - `CommunicationError` / `ActuationFailure`：执行器报告的错误
    pub fn submit(&self, command: MotionCommand) -> Result<Dispatch> {
        let kind = command.kind();
        let plan = self.plan(command).inspect_err(|err| {
            warn!("Rejected {} command: {}", kind, err);
        })?;

        match plan {
            Plan::Skip(kind) => {
                debug!("{} command with zero speed, nothing to do", kind);
                Ok(Dispatch::new(kind, DispatchStatus::Skipped))
            },
            Plan::Blocking(intent) => self.run_blocking(intent),
            Plan::Background(intent) => self.run_background(intent),
        }
    }

    /// 停止行走
    ///
    /// 任何状态下都可调用，可重复调用。正在跟随的路径不再下发剩余路点。
    /// 只有执行器不可达时返回错误，此时 Locomotion 状态保持不变。
    pub fn move_stop(&self) -> Result<()> {
        // 先使占用过期，等待中的命令被唤醒时已能看到停止
        let stopped = self.tracker.stop(ExecutionSlot::Locomotion);
        match self.actuation.stop(ExecutionSlot::Locomotion) {
            Ok(()) => {},
            Err(err @ MotionError::CommunicationError(_)) => {
                self.tracker.revert(stopped);
                warn!("Stop failed, actuation unreachable: {}", err);
                return Err(err);
            },
            Err(err) => {
                warn!("Actuation reported '{}' while stopping, treating as stopped", err);
            },
        }

        if !stopped.previous().is_idle() {
            debug!("Locomotion stopped (was {})", stopped.previous());
        }
        Ok(())
    }

    /// 会话结束：停止后台行走并清空所有槽
    pub(crate) fn teardown(&self) {
        if let SlotState::Background(kind) = self.tracker.state(ExecutionSlot::Locomotion) {
            info!("Stopping background {} before teardown", kind);
            if let Err(err) = self.actuation.stop(ExecutionSlot::Locomotion) {
                warn!("Failed to stop locomotion during teardown: {}", err);
            }
        }
        self.tracker.reset();
    }

    /// 为整条路径占用 Locomotion
    ///
    /// 守卫存活期间其他 Locomotion 命令返回 `Busy`；`move_stop` 使守卫过期。
    pub(crate) fn claim_path(&self) -> Result<BlockingGuard<'_>> {
        let kind = CommandKind::FollowPath;
        let guard = self
            .tracker
            .acquire_blocking(&[ExecutionSlot::Locomotion], kind)
            .inspect_err(|err| {
                warn!("Rejected {} command: {}", kind, err);
            })?;
        debug!("Locomotion claimed for path (ticket {})", guard.ticket().id());
        Ok(guard)
    }

    /// 在路径占用下执行一个路点，等待到达
    pub(crate) fn walk_waypoint(&self, claim: &BlockingGuard<'_>, pose: Pose, frame: Frame) -> Result<()> {
        let intent = goal_pose_intent(pose, frame)?;
        trace!("Waypoint dispatched under ticket {}", claim.ticket().id());
        self.actuation
            .execute(&intent)
            .and_then(|completion| completion.wait())
    }

    fn run_blocking(&self, intent: ActuationIntent) -> Result<Dispatch> {
        let kind = intent.kind();
        let slots = intent.slots();

        let guard = self.tracker.acquire_blocking(&slots, kind).inspect_err(|err| {
            warn!("Rejected {} command: {}", kind, err);
        })?;
        debug!(
            "Dispatching {} on {:?} (ticket {})",
            kind,
            guard.slots(),
            guard.ticket().id()
        );

        let outcome = self
            .actuation
            .execute(&intent)
            .and_then(|completion| completion.wait());
        drop(guard);

        match outcome {
            Ok(()) => {
                debug!("{} completed", kind);
                Ok(Dispatch::new(kind, DispatchStatus::Completed))
            },
            Err(err) => {
                warn!("{} failed: {}", kind, err);
                Err(err)
            },
        }
    }

    fn run_background(&self, intent: ActuationIntent) -> Result<Dispatch> {
        let kind = intent.kind();
        let claim = self
            .tracker
            .acquire_background(ExecutionSlot::Locomotion, kind)
            .inspect_err(|err| {
                warn!("Rejected {} command: {}", kind, err);
            })?;

        match self.actuation.execute(&intent) {
            Ok(_completion) => {
                debug!("{} running in background (ticket {})", kind, claim.ticket().id());
                Ok(Dispatch::new(kind, DispatchStatus::Started))
            },
            Err(err) => {
                self.tracker.revert(claim);
                warn!("{} failed: {}", kind, err);
                Err(err)
            },
        }
    }

    fn plan(&self, command: MotionCommand) -> Result<Plan> {
        match command {
            MotionCommand::Velocity(velocity) => self.plan_velocity(velocity),
            MotionCommand::GoalPose { pose, frame } => Self::plan_goal_pose(pose, frame),
            MotionCommand::Joints {
                names,
                angles,
                speed,
            } => self.plan_joints(&names, &angles, speed),
            MotionCommand::Posture { name, speed } => self.plan_posture(&name, speed),
            MotionCommand::Rest { name } => self.plan_rest(&name),
            MotionCommand::GazePoint { target } => {
                ensure_finite_point("target", &target)?;
                Ok(Plan::Blocking(ActuationIntent::LookAt {
                    target,
                    speed: self.speeds.gaze(),
                }))
            },
            MotionCommand::ArmPoint { target } => {
                ensure_finite_point("target", &target)?;
                Ok(Plan::Blocking(ActuationIntent::PointArm {
                    chain: pointing_arm(&target),
                    target,
                    speed: self.speeds.pointing(),
                }))
            },
            MotionCommand::FollowPath(_) => Err(MotionError::invalid_argument(
                "command",
                "paths are executed by PathFollower",
            )),
        }
    }

    fn plan_velocity(&self, velocity: VelocityCommand) -> Result<Plan> {
        if !velocity.is_finite() {
            return Err(MotionError::invalid_argument(
                "velocity",
                "components must be finite",
            ));
        }

        let base = VelocityMode::for_base(self.actuation.holonomic_capable());
        if velocity.mode() != base {
            return Err(MotionError::UnsupportedMotionMode {
                requested: velocity.mode(),
                base,
            });
        }

        Ok(Plan::Background(ActuationIntent::Velocity(velocity)))
    }

    fn plan_goal_pose(pose: Pose, frame: Frame) -> Result<Plan> {
        goal_pose_intent(pose, frame).map(Plan::Blocking)
    }

    fn plan_joints(&self, names: &[String], angles: &[f64], speed: Option<f64>) -> Result<Plan> {
        let joints = self.topology.expand(names)?;
        if joints.is_empty() {
            return Err(MotionError::invalid_argument("names", "no joints requested"));
        }
        if angles.len() != joints.len() {
            return Err(MotionError::invalid_argument(
                "angles",
                format!(
                    "{} joints requested but {} angles given",
                    joints.len(),
                    angles.len()
                ),
            ));
        }
        if let Some(index) = angles.iter().position(|angle| !angle.is_finite()) {
            return Err(MotionError::invalid_argument(
                "angles",
                format!("angle #{} is not finite", index),
            ));
        }

        let speed = match speed {
            Some(raw) => speed_fraction(raw)?,
            None => self.speeds.default_joint(),
        };
        if speed.is_zero() {
            return Ok(Plan::Skip(CommandKind::JointTarget));
        }

        let mut targets: JointTargets = joints
            .iter()
            .zip(angles)
            .map(|(joint, angle)| JointTarget::new(*joint, Rad(*angle), speed))
            .collect();
        if let Some(requested) = HIP_YAW_PITCH.resolve(&mut targets) {
            debug!(
                "{} request {} overridden by {}",
                HIP_YAW_PITCH.secondary, requested, HIP_YAW_PITCH.primary
            );
        }

        Ok(Plan::Blocking(ActuationIntent::Joints { targets }))
    }

    fn plan_posture(&self, name: &str, speed: Option<f64>) -> Result<Plan> {
        let posture = parse_posture(name)?;
        let speed = match speed {
            Some(raw) => speed_fraction(raw)?,
            None => self.speeds.posture(),
        };
        if speed.is_zero() {
            return Ok(Plan::Skip(CommandKind::Posture));
        }
        Ok(Plan::Blocking(ActuationIntent::Posture { posture, speed }))
    }

    fn plan_rest(&self, name: &str) -> Result<Plan> {
        let posture = parse_posture(name)?;
        if !posture.is_safe_for_rest() {
            return Err(MotionError::UnsafePosture(posture));
        }
        Ok(Plan::Blocking(ActuationIntent::Rest {
            posture,
            speed: self.speeds.rest(),
        }))
    }
}

impl std::fmt::Debug for CommandArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandArbiter")
            .field("topology", &self.topology)
            .field("speeds", &self.speeds)
            .field("tracker", &self.tracker.snapshot())
            .finish_non_exhaustive()
    }
}

fn goal_pose_intent(pose: Pose, frame: Frame) -> Result<ActuationIntent> {
    if !pose.is_finite() {
        return Err(MotionError::invalid_argument("pose", "must be finite"));
    }
    Ok(ActuationIntent::GoalPose { pose, frame })
}

fn parse_posture(name: &str) -> Result<Posture> {
    name.parse::<Posture>().map_err(MotionError::from)
}

fn speed_fraction(raw: f64) -> Result<SpeedFraction> {
    if !raw.is_finite() {
        return Err(MotionError::invalid_argument("speed", "must be finite"));
    }
    Ok(SpeedFraction::new(raw))
}

fn ensure_finite_point(param: &'static str, point: &Point3<f64>) -> Result<()> {
    if point.coords.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(MotionError::invalid_argument(param, "coordinates must be finite"))
    }
}

/// 目标在左侧（含正前方）用左臂，否则用右臂
fn pointing_arm(target: &Point3<f64>) -> Chain {
    if target.y >= 0.0 { Chain::LArm } else { Chain::RArm }
}
