//! 协作方接口
//!
//! 运动层不直接访问硬件，所有外部能力都通过以下 trait 注入：
//!
//! - [`Actuation`]：执行意图、查询底盘能力、停止
//! - [`Localization`]：全局位姿的读取与写入
//! - [`ObstacleSignal`]：前方障碍物检测
//! - [`Kinematics`]：链/关节的正运动学变换
//!
//! 阻塞命令的完成通过 [`Completion`] 通知，它包装了一个单次使用的
//! crossbeam 通道。

use crate::command::{ActuationIntent, ExecutionSlot};
use crate::error::{MotionError, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use strider_types::nalgebra::Matrix4;
use strider_types::{JointSelector, Pose, Space};

/// 执行器
pub trait Actuation: Send + Sync {
    /// 执行意图
    ///
    /// 立即返回；阻塞命令的最终结果通过返回的 [`Completion`] 送达。
    /// 非阻塞命令（速度控制）的 `Completion` 会被直接丢弃。
    fn execute(&self, intent: &ActuationIntent) -> Result<Completion>;

    /// 底盘是否支持全向速度控制
    fn holonomic_capable(&self) -> bool;

    /// 停止执行槽上的运动
    fn stop(&self, slot: ExecutionSlot) -> Result<()>;
}

/// 定位模块
pub trait Localization: Send + Sync {
    /// 当前全局位姿
    ///
    /// 未初始化时返回 `MotionError::LocalizationUnavailable`。
    fn current_global_pose(&self) -> Result<Pose>;

    /// 写入真实位姿，返回定位模块是否接受
    fn set_global_pose(&self, pose: &Pose) -> Result<bool>;
}

/// 障碍物信号
pub trait ObstacleSignal: Send + Sync {
    fn obstacle_present(&self) -> bool;
}

/// 运动学查询
///
/// 每次调用都基于当前关节状态重新计算。
pub trait Kinematics: Send + Sync {
    fn transform(&self, selector: JointSelector, space: Space) -> Result<Matrix4<f64>>;
}

/// 阻塞命令的完成信号接收端
#[derive(Debug)]
pub struct Completion {
    rx: Receiver<Result<()>>,
}

/// 完成信号发送端
///
/// 被丢弃而未调用 [`complete`](Self::complete) 时，等待方收到通信错误。
#[derive(Debug)]
pub struct CompletionSender {
    tx: Sender<Result<()>>,
}

impl Completion {
    /// 创建一对发送端/接收端
    pub fn channel() -> (CompletionSender, Completion) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (CompletionSender { tx }, Completion { rx })
    }

    /// 已经完成的信号
    pub fn ready(outcome: Result<()>) -> Self {
        let (sender, completion) = Self::channel();
        sender.complete(outcome);
        completion
    }

    /// 阻塞等待最终结果
    pub fn wait(self) -> Result<()> {
        match self.rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(MotionError::communication(
                "actuation dropped the completion signal",
            )),
        }
    }

    /// 非阻塞查询结果（尚未完成时返回 `None`）
    pub fn try_outcome(&self) -> Option<Result<()>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(MotionError::communication(
                "actuation dropped the completion signal",
            ))),
        }
    }
}

impl CompletionSender {
    /// 发送最终结果
    pub fn complete(self, outcome: Result<()>) {
        // 接收端已放弃等待时忽略
        let _ = self.tx.try_send(outcome);
    }
}
