//! Strider SDK - 人形机器人导航与运动控制
//!
//! # 架构设计
//!
//! - **类型层** (`strider-types`): 位姿、关节拓扑、姿态、单位
//! - **配置层** (`strider-tools`): TOML 导航配置
//! - **运动层** (`strider-motion`): 命令仲裁、执行跟踪、路径跟随、会话
//! - **门面** ([`Navigation`]): 布尔返回值的调用接口
//!
//! # 快速开始
//!
//! ```rust
//! use strider_sdk::prelude::*;
//!
//! let (nav, _robot) = Navigation::simulated(NavigationConfig::default())?;
//! assert!(nav.move_joint(&["HeadYaw", "HeadPitch"], &[0.3, -0.1]));
//! assert!(nav.move_to(0.5, 0.0, 0.0));
//! assert!(!nav.rest("Stand")); // Stand 不允许卸力
//! # Ok::<(), MotionError>(())
//! ```
//!
//! 布尔接口会丢失错误细节（失败原因只写入日志）。需要完整错误信息时
//! 通过 [`Navigation::session`] 使用 `Result` 接口。

pub mod logging;
pub mod prelude;

pub use strider_motion as motion;
pub use strider_tools as tools;
pub use strider_types as types;

pub use strider_motion::{
    Collaborators, CommandArbiter, MotionCommand, MotionError, PathOutcome, Session,
};
pub use strider_tools::NavigationConfig;

use std::sync::Arc;
use strider_motion::sim::SimulatedRobot;
use strider_types::nalgebra::{Matrix4, Point3};
use strider_types::{Frame, Pose, PoseStamped, Rad, Space};
use tracing::warn;

/// 导航门面
///
/// 所有操作在失败时返回 `false`/`None`，并以 `warn` 级别记录错误类型。
#[derive(Debug)]
pub struct Navigation {
    session: Session,
}

impl Navigation {
    /// 创建导航接口
    pub fn new(config: NavigationConfig, collaborators: Collaborators) -> Result<Self, MotionError> {
        Ok(Navigation {
            session: Session::start(config, collaborators)?,
        })
    }

    /// 使用进程内模拟机器人创建导航接口
    pub fn simulated(config: NavigationConfig) -> Result<(Self, Arc<SimulatedRobot>), MotionError> {
        let robot = Arc::new(SimulatedRobot::new());
        let nav = Self::new(config, Collaborators::from_robot(robot.clone()))?;
        Ok((nav, robot))
    }

    /// 完整错误信息的会话接口
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 手臂指向全局坐标系中的点
    pub fn point_arm(&self, x: f64, y: f64, z: f64) -> bool {
        succeeded("point_arm", self.session.point_arm_at(&Point3::new(x, y, z)))
    }

    /// 移动到相对当前位置的目标（机器人坐标系）
    pub fn move_to(&self, x: f64, y: f64, theta: f64) -> bool {
        let command = MotionCommand::GoalPose {
            pose: Pose::planar(x, y, Rad(theta)),
            frame: Frame::Robot,
        };
        succeeded("move_to", self.session.submit(command))
    }

    /// 全向速度控制（非阻塞）
    pub fn move_vel(&self, x: f64, y: f64, theta: f64) -> bool {
        succeeded("move_vel", self.session.submit(MotionCommand::velocity(x, y, theta)))
    }

    /// 非全向速度控制（非阻塞）
    pub fn move_vel_nonholonomic(&self, x: f64, theta: f64) -> bool {
        succeeded(
            "move_vel_nonholonomic",
            self.session.submit(MotionCommand::velocity_nonholonomic(x, theta)),
        )
    }

    /// 停止行走
    pub fn move_stop(&self) -> bool {
        succeeded("move_stop", self.session.move_stop())
    }

    /// 关节/链运动（默认速度）
    pub fn move_joint<S: AsRef<str>>(&self, names: &[S], angles: &[f64]) -> bool {
        self.joint_command("move_joint", names, angles, None)
    }

    /// 关节/链运动（指定速度比例，0 表示不运动）
    pub fn move_joint_with_speed<S: AsRef<str>>(&self, names: &[S], angles: &[f64], speed: f64) -> bool {
        self.joint_command("move_joint_with_speed", names, angles, Some(speed))
    }

    /// 预定义姿态
    pub fn take_predefined_posture(&self, name: &str, speed: f64) -> bool {
        self.posture_command("take_predefined_posture", name, Some(speed))
    }

    /// 以配置的默认速度进入预定义姿态
    pub fn take_default_posture(&self, name: &str) -> bool {
        self.posture_command("take_default_posture", name, None)
    }

    /// 头部注视全局坐标系中的点
    pub fn look_at_point(&self, x: f64, y: f64, z: f64) -> bool {
        succeeded("look_at_point", self.session.look_at(&Point3::new(x, y, z)))
    }

    /// 到指定姿态后卸力
    pub fn rest(&self, name: &str) -> bool {
        let command = MotionCommand::Rest {
            name: name.to_string(),
        };
        succeeded("rest", self.session.submit(command))
    }

    /// 沿路径行走
    ///
    /// 只有到达全部路点才返回 `true`，因障碍物中止返回 `false`。
    pub fn move_along_path(&self, poses: &[PoseStamped]) -> bool {
        match report("move_along_path", self.session.follow_path(poses)) {
            Some(PathOutcome::Completed { .. }) => true,
            Some(PathOutcome::Aborted { last_reached }) => {
                warn!(
                    operation = "move_along_path",
                    "Path aborted (last reached: {:?})", last_reached
                );
                false
            },
            None => false,
        }
    }

    /// 当前全局位姿
    pub fn get_global_pose(&self) -> Option<PoseStamped> {
        report("get_global_pose", self.session.global_pose())
    }

    /// 写入真实位姿
    pub fn set_global_pose(&self, pose: &Pose) -> bool {
        report("set_global_pose", self.session.set_global_pose(pose)).unwrap_or(false)
    }

    /// 链或关节的当前变换
    ///
    /// `space`: 0 = Torso, 1 = World, 2 = Robot
    pub fn get_transform(&self, chain: &str, space: i32) -> Option<Matrix4<f64>> {
        let result = Space::try_from(space)
            .map_err(|_| MotionError::invalid_argument("space", format!("unknown space {}", space)))
            .and_then(|space| self.session.transform(chain, space));
        report("get_transform", result)
    }

    fn posture_command(&self, operation: &'static str, name: &str, speed: Option<f64>) -> bool {
        let command = MotionCommand::Posture {
            name: name.to_string(),
            speed,
        };
        succeeded(operation, self.session.submit(command))
    }

    fn joint_command<S: AsRef<str>>(
        &self,
        operation: &'static str,
        names: &[S],
        angles: &[f64],
        speed: Option<f64>,
    ) -> bool {
        let command = MotionCommand::Joints {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            angles: angles.to_vec(),
            speed,
        };
        succeeded(operation, self.session.submit(command))
    }
}

fn report<T>(operation: &'static str, result: Result<T, MotionError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                operation,
                validation = err.is_validation(),
                collaborator = err.is_collaborator(),
                "{}",
                err
            );
            None
        },
    }
}

fn succeeded<T>(operation: &'static str, result: Result<T, MotionError>) -> bool {
    report(operation, result).is_some()
}
