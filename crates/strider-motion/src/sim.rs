//! 进程内模拟机器人
//!
//! [`SimulatedRobot`] 同时实现四个协作方 trait，用于测试与离线演示：
//!
//! - 记录每次执行/停止调用
//! - 可按调用序号注入失败、模拟通信中断
//! - 可挂起指定执行槽的完成信号，模拟长时间运行的阻塞命令
//! - 目标位姿命令会更新模拟定位结果
//! - 运动学结果取决于最近一次下发的关节角度
//!
//! 尺寸常量取自标准人形平台（单位：米）。

use crate::command::{ActuationIntent, ExecutionSlot, SlotSet};
use crate::error::{MotionError, Result};
use crate::interfaces::{Actuation, Completion, CompletionSender, Kinematics, Localization, ObstacleSignal};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use strider_types::nalgebra::{Matrix4, UnitQuaternion};
use strider_types::{Chain, Frame, JointName, JointSelector, Pose, Rad, Space};
use tracing::trace;

/// 髋部中心到颈部
const TORSO_TO_NECK: [f64; 3] = [0.0, 0.0, 0.2115];
/// 髋部中心到左肩
const TORSO_TO_LEFT_SHOULDER: [f64; 3] = [0.0, 0.098, 0.185];
/// 髋部中心到右肩
const TORSO_TO_RIGHT_SHOULDER: [f64; 3] = [0.0, -0.098, 0.185];
/// 髋部中心到左髋
const TORSO_TO_LEFT_PELVIS: [f64; 3] = [0.0, 0.05, 0.0];
/// 髋部中心到右髋
const TORSO_TO_RIGHT_PELVIS: [f64; 3] = [0.0, -0.05, 0.0];
/// 站立时髋部中心离地高度（大腿 + 小腿 + 脚踝到脚底）
const STANDING_HIP_HEIGHT: f64 = 0.1 + 0.1029 + 0.04519;

/// 模拟执行器收到的调用
#[derive(Debug, Clone, PartialEq)]
pub enum ActuationCall {
    Execute(ActuationIntent),
    Stop(ExecutionSlot),
}

#[derive(Debug)]
struct PendingCompletion {
    slots: SlotSet,
    sender: CompletionSender,
}

#[derive(Debug)]
struct SimState {
    holonomic: bool,
    reachable: bool,
    calls: Vec<ActuationCall>,
    execute_count: usize,
    failures: HashMap<usize, MotionError>,
    held_slots: Vec<ExecutionSlot>,
    pending: Vec<PendingCompletion>,
    global_pose: Option<Pose>,
    accept_pose_updates: bool,
    obstacle_schedule: VecDeque<bool>,
    obstacle_default: bool,
    obstacle_polls: usize,
    joint_angles: HashMap<JointName, Rad>,
}

impl Default for SimState {
    fn default() -> Self {
        SimState {
            holonomic: true,
            reachable: true,
            calls: Vec::new(),
            execute_count: 0,
            failures: HashMap::new(),
            held_slots: Vec::new(),
            pending: Vec::new(),
            global_pose: Some(Pose::identity()),
            accept_pose_updates: true,
            obstacle_schedule: VecDeque::new(),
            obstacle_default: false,
            obstacle_polls: 0,
            joint_angles: HashMap::new(),
        }
    }
}

impl SimState {
    fn apply(&mut self, intent: &ActuationIntent) {
        match intent {
            ActuationIntent::GoalPose { pose, frame } => {
                if let Some(current) = self.global_pose {
                    self.global_pose = Some(match frame {
                        Frame::Global => *pose,
                        Frame::Robot => current.compose(pose),
                    });
                }
            },
            ActuationIntent::Joints { targets } => {
                for target in targets {
                    self.joint_angles.insert(target.joint, target.angle);
                }
            },
            _ => {},
        }
    }
}

/// 模拟机器人
///
/// 默认状态：全向底盘、可达、已定位于原点、接受位姿写入、无障碍物。
#[derive(Debug, Default)]
pub struct SimulatedRobot {
    state: Mutex<SimState>,
}

impl SimulatedRobot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置底盘是否为全向底盘
    pub fn set_holonomic(&self, holonomic: bool) {
        self.state.lock().holonomic = holonomic;
    }

    /// 设置是否可达（不可达时所有调用返回通信错误）
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
    }

    /// 第 `index` 次执行调用（从 0 开始）报告失败
    ///
    /// 通信错误在 `execute` 时直接返回，其他错误通过完成信号送达。
    pub fn fail_execution(&self, index: usize, error: MotionError) {
        self.state.lock().failures.insert(index, error);
    }

    /// 挂起触及该槽的阻塞命令，直到调用 [`release_held`](Self::release_held)
    pub fn hold_slot(&self, slot: ExecutionSlot) {
        let mut state = self.state.lock();
        if !state.held_slots.contains(&slot) {
            state.held_slots.push(slot);
        }
    }

    /// 取消挂起并以 `outcome` 完成该槽上所有挂起的命令
    ///
    /// 返回完成的命令数。
    pub fn release_held(&self, slot: ExecutionSlot, outcome: Result<()>) -> usize {
        let released = {
            let mut state = self.state.lock();
            state.held_slots.retain(|s| *s != slot);
            drain_pending(&mut state.pending, slot)
        };
        let count = released.len();
        for pending in released {
            pending.sender.complete(outcome.clone());
        }
        count
    }

    /// 挂起中的命令数
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// 设置定位结果（`None` 表示未初始化）
    pub fn set_localization(&self, pose: Option<Pose>) {
        self.state.lock().global_pose = pose;
    }

    /// 设置是否接受位姿写入
    pub fn set_accept_pose_updates(&self, accept: bool) {
        self.state.lock().accept_pose_updates = accept;
    }

    /// 按轮询顺序设定障碍物结果，用完后回到常量值
    pub fn script_obstacles(&self, schedule: impl IntoIterator<Item = bool>) {
        let mut state = self.state.lock();
        state.obstacle_schedule = schedule.into_iter().collect();
    }

    /// 设定障碍物常量值并清除脚本
    pub fn set_obstacle(&self, present: bool) {
        let mut state = self.state.lock();
        state.obstacle_schedule.clear();
        state.obstacle_default = present;
    }

    /// 障碍物信号被轮询的次数
    pub fn obstacle_polls(&self) -> usize {
        self.state.lock().obstacle_polls
    }

    /// 所有调用记录
    pub fn calls(&self) -> Vec<ActuationCall> {
        self.state.lock().calls.clone()
    }

    /// 执行过的意图
    pub fn executed(&self) -> Vec<ActuationIntent> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ActuationCall::Execute(intent) => Some(intent.clone()),
                ActuationCall::Stop(_) => None,
            })
            .collect()
    }

    /// 执行调用次数
    pub fn execute_count(&self) -> usize {
        self.state.lock().execute_count
    }

    /// 停止调用次数
    pub fn stop_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, ActuationCall::Stop(_)))
            .count()
    }

    /// 执行器是否被调用过（执行或停止）
    pub fn was_contacted(&self) -> bool {
        !self.state.lock().calls.is_empty()
    }

    /// 最近一次下发的关节角度
    pub fn joint_angle(&self, joint: JointName) -> Rad {
        self.state
            .lock()
            .joint_angles
            .get(&joint)
            .copied()
            .unwrap_or(Rad::ZERO)
    }
}

fn drain_pending(pending: &mut Vec<PendingCompletion>, slot: ExecutionSlot) -> Vec<PendingCompletion> {
    let mut drained = Vec::new();
    let mut index = 0;
    while index < pending.len() {
        if pending[index].slots.contains(&slot) {
            drained.push(pending.swap_remove(index));
        } else {
            index += 1;
        }
    }
    drained
}

fn unreachable_error() -> MotionError {
    MotionError::communication("simulated robot is unreachable")
}

impl Actuation for SimulatedRobot {
    fn execute(&self, intent: &ActuationIntent) -> Result<Completion> {
        let mut state = self.state.lock();
        if !state.reachable {
            return Err(unreachable_error());
        }

        let index = state.execute_count;
        state.execute_count += 1;
        state.calls.push(ActuationCall::Execute(intent.clone()));
        trace!("Simulated execute #{}: {:?}", index, intent);

        if let Some(error) = state.failures.remove(&index) {
            return match error {
                MotionError::CommunicationError(_) => Err(error),
                other => Ok(Completion::ready(Err(other))),
            };
        }

        state.apply(intent);

        let slots = intent.slots();
        let held = intent.kind().is_blocking()
            && slots.iter().any(|slot| state.held_slots.contains(slot));
        if held {
            let (sender, completion) = Completion::channel();
            state.pending.push(PendingCompletion { slots, sender });
            return Ok(completion);
        }

        Ok(Completion::ready(Ok(())))
    }

    fn holonomic_capable(&self) -> bool {
        self.state.lock().holonomic
    }

    fn stop(&self, slot: ExecutionSlot) -> Result<()> {
        let interrupted = {
            let mut state = self.state.lock();
            if !state.reachable {
                return Err(unreachable_error());
            }
            state.calls.push(ActuationCall::Stop(slot));
            drain_pending(&mut state.pending, slot)
        };

        for pending in interrupted {
            pending
                .sender
                .complete(Err(MotionError::actuation("motion interrupted by stop")));
        }
        Ok(())
    }
}

impl Localization for SimulatedRobot {
    fn current_global_pose(&self) -> Result<Pose> {
        let state = self.state.lock();
        if !state.reachable {
            return Err(unreachable_error());
        }
        state.global_pose.ok_or(MotionError::LocalizationUnavailable)
    }

    fn set_global_pose(&self, pose: &Pose) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.reachable {
            return Err(unreachable_error());
        }
        if state.accept_pose_updates {
            state.global_pose = Some(*pose);
        }
        Ok(state.accept_pose_updates)
    }
}

impl ObstacleSignal for SimulatedRobot {
    fn obstacle_present(&self) -> bool {
        let mut state = self.state.lock();
        state.obstacle_polls += 1;
        match state.obstacle_schedule.pop_front() {
            Some(present) => present,
            None => state.obstacle_default,
        }
    }
}

fn chain_base(chain: Chain) -> [f64; 3] {
    match chain {
        Chain::Head => TORSO_TO_NECK,
        Chain::LArm => TORSO_TO_LEFT_SHOULDER,
        Chain::RArm => TORSO_TO_RIGHT_SHOULDER,
        Chain::LLeg => TORSO_TO_LEFT_PELVIS,
        Chain::RLeg => TORSO_TO_RIGHT_PELVIS,
    }
}

impl Kinematics for SimulatedRobot {
    /// 链根部位姿绕 z 轴旋转链上第一个关节的当前角度
    fn transform(&self, selector: JointSelector, space: Space) -> Result<Matrix4<f64>> {
        let state = self.state.lock();
        if !state.reachable {
            return Err(unreachable_error());
        }

        let chain = match selector {
            JointSelector::Joint(joint) => joint.chain(),
            JointSelector::Chain(chain) => chain,
        };
        let yaw = chain
            .joints()
            .first()
            .and_then(|joint| state.joint_angles.get(joint))
            .copied()
            .unwrap_or(Rad::ZERO);

        let [x, y, z] = chain_base(chain);
        let in_torso = Pose::new(x, y, z, UnitQuaternion::from_euler_angles(0.0, 0.0, yaw.value()));
        let torso_in_robot = Pose::from_position(0.0, 0.0, STANDING_HIP_HEIGHT);

        let pose = match space {
            Space::Torso => in_torso,
            Space::Robot => torso_in_robot.compose(&in_torso),
            Space::World => state
                .global_pose
                .unwrap_or_default()
                .compose(&torso_in_robot)
                .compose(&in_torso),
        };
        Ok(pose.to_homogeneous())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::VelocityCommand;
    use approx::assert_relative_eq;
    use strider_types::{JointTarget, SpeedFraction};

    fn goal(x: f64, y: f64) -> ActuationIntent {
        ActuationIntent::GoalPose {
            pose: Pose::planar(x, y, Rad::ZERO),
            frame: Frame::Robot,
        }
    }

    #[test]
    fn test_records_calls() {
        let sim = SimulatedRobot::new();
        sim.execute(&goal(1.0, 0.0)).unwrap().wait().unwrap();
        sim.stop(ExecutionSlot::Locomotion).unwrap();

        assert_eq!(sim.execute_count(), 1);
        assert_eq!(sim.stop_count(), 1);
        assert_eq!(sim.calls()[1], ActuationCall::Stop(ExecutionSlot::Locomotion));
    }

    #[test]
    fn test_goal_pose_updates_localization() {
        let sim = SimulatedRobot::new();
        sim.execute(&goal(1.0, 0.5)).unwrap().wait().unwrap();
        sim.execute(&goal(1.0, 0.0)).unwrap().wait().unwrap();

        let pose = sim.current_global_pose().unwrap();
        assert_relative_eq!(pose.x(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(pose.y(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_injected_failures() {
        let sim = SimulatedRobot::new();
        sim.fail_execution(1, MotionError::actuation("blocked"));
        sim.fail_execution(2, MotionError::communication("link down"));

        assert!(sim.execute(&goal(1.0, 0.0)).unwrap().wait().is_ok());
        assert_eq!(
            sim.execute(&goal(1.0, 0.0)).unwrap().wait(),
            Err(MotionError::actuation("blocked"))
        );
        assert!(matches!(
            sim.execute(&goal(1.0, 0.0)),
            Err(MotionError::CommunicationError(_))
        ));
    }

    #[test]
    fn test_held_completion_and_stop() {
        let sim = SimulatedRobot::new();
        sim.hold_slot(ExecutionSlot::Locomotion);

        let completion = sim.execute(&goal(1.0, 0.0)).unwrap();
        assert!(completion.try_outcome().is_none());
        assert_eq!(sim.pending_count(), 1);

        // 速度命令不会被挂起
        let velocity = ActuationIntent::Velocity(VelocityCommand::Holonomic {
            x: 0.5,
            y: 0.0,
            theta: 0.0,
        });
        assert!(sim.execute(&velocity).unwrap().try_outcome().is_some());

        sim.stop(ExecutionSlot::Locomotion).unwrap();
        assert!(matches!(completion.wait(), Err(MotionError::ActuationFailure(_))));
        assert_eq!(sim.pending_count(), 0);
    }

    #[test]
    fn test_release_held() {
        let sim = SimulatedRobot::new();
        sim.hold_slot(ExecutionSlot::Head);
        let completion = sim
            .execute(&ActuationIntent::LookAt {
                target: strider_types::nalgebra::Point3::new(1.0, 0.0, 0.5),
                speed: SpeedFraction::MAX,
            })
            .unwrap();

        assert_eq!(sim.release_held(ExecutionSlot::Head, Ok(())), 1);
        assert_eq!(completion.wait(), Ok(()));
    }

    #[test]
    fn test_unreachable() {
        let sim = SimulatedRobot::new();
        sim.set_reachable(false);
        assert!(matches!(sim.execute(&goal(1.0, 0.0)), Err(MotionError::CommunicationError(_))));
        assert!(sim.stop(ExecutionSlot::Locomotion).is_err());
        assert!(!sim.was_contacted());
    }

    #[test]
    fn test_localization() {
        let sim = SimulatedRobot::new();
        sim.set_localization(None);
        assert_eq!(
            sim.current_global_pose(),
            Err(MotionError::LocalizationUnavailable)
        );

        let pose = Pose::planar(3.0, -1.0, Rad(0.5));
        assert_eq!(sim.set_global_pose(&pose), Ok(true));
        assert!(sim.current_global_pose().unwrap().approx_eq(&pose, 1e-9));

        sim.set_accept_pose_updates(false);
        assert_eq!(sim.set_global_pose(&Pose::identity()), Ok(false));
        assert!(sim.current_global_pose().unwrap().approx_eq(&pose, 1e-9));
    }

    #[test]
    fn test_obstacle_script() {
        let sim = SimulatedRobot::new();
        sim.script_obstacles([false, true]);
        assert!(!sim.obstacle_present());
        assert!(sim.obstacle_present());
        assert!(!sim.obstacle_present());
        assert_eq!(sim.obstacle_polls(), 3);

        sim.set_obstacle(true);
        assert!(sim.obstacle_present());
    }

    #[test]
    fn test_transform_follows_joint_state() {
        let sim = SimulatedRobot::new();
        let before = sim
            .transform(JointSelector::Chain(Chain::Head), Space::Torso)
            .unwrap();
        assert_relative_eq!(before[(2, 3)], 0.2115, epsilon = 1e-9);

        let mut targets = crate::command::JointTargets::new();
        targets.push(JointTarget::new(JointName::HeadYaw, Rad(0.5), SpeedFraction::MAX));
        sim.execute(&ActuationIntent::Joints { targets }).unwrap().wait().unwrap();

        let after = sim
            .transform(JointSelector::Joint(JointName::HeadPitch), Space::Torso)
            .unwrap();
        assert!(before != after);
        assert_relative_eq!(after[(1, 0)], 0.5_f64.sin(), epsilon = 1e-9);

        let robot = sim
            .transform(JointSelector::Chain(Chain::Head), Space::Robot)
            .unwrap();
        assert_relative_eq!(robot[(2, 3)], 0.2115 + STANDING_HIP_HEIGHT, epsilon = 1e-9);
    }
}
