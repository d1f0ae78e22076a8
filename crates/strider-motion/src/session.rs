//! 导航会话
//!
//! 一个 [`Session`] 对应一台机器人：持有配置、仲裁器（及其执行跟踪器）
//! 和全部协作方。会话被丢弃时停止后台行走并把所有执行槽恢复为空闲。
//!
//! # 示例
//!
//! ```rust
//! use std::sync::Arc;
//! use strider_motion::sim::SimulatedRobot;
//! use strider_motion::{Collaborators, MotionCommand, Session};
//! use strider_tools::NavigationConfig;
//!
//! let robot = Arc::new(SimulatedRobot::new());
//! let session = Session::start(NavigationConfig::default(), Collaborators::from_robot(robot))?;
//!
//! session.submit(MotionCommand::joints(["HeadYaw"], [0.3], None))?;
//! let pose = session.global_pose()?;
//! assert_eq!(pose.frame(), strider_types::Frame::Global);
//! # Ok::<(), strider_motion::MotionError>(())
//! ```

use crate::arbiter::CommandArbiter;
use crate::command::{Dispatch, MotionCommand};
use crate::error::{MotionError, Result};
use crate::interfaces::{Actuation, Kinematics, Localization, ObstacleSignal};
use crate::path::{PathFollower, PathOutcome};
use crate::tracker::TrackerSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use strider_tools::NavigationConfig;
use strider_types::nalgebra::{Matrix4, Point3};
use strider_types::{Pose, PoseStamped, Space};
use tracing::{debug, info, warn};

/// 会话使用的全部协作方
#[derive(Clone)]
pub struct Collaborators {
    pub actuation: Arc<dyn Actuation>,
    pub localization: Arc<dyn Localization>,
    pub obstacle: Arc<dyn ObstacleSignal>,
    pub kinematics: Arc<dyn Kinematics>,
}

impl Collaborators {
    /// 由同时实现四个接口的对象构造
    pub fn from_robot<R>(robot: Arc<R>) -> Self
    where
        R: Actuation + Localization + ObstacleSignal + Kinematics + 'static,
    {
        Collaborators {
            actuation: robot.clone(),
            localization: robot.clone(),
            obstacle: robot.clone(),
            kinematics: robot,
        }
    }
}

/// [`Session::submit`] 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dispatched(Dispatch),
    Path(PathOutcome),
}

/// 导航会话
pub struct Session {
    config: NavigationConfig,
    arbiter: CommandArbiter,
    localization: Arc<dyn Localization>,
    obstacle: Arc<dyn ObstacleSignal>,
    kinematics: Arc<dyn Kinematics>,
    pose_seq: AtomicU32,
}

impl Session {
    /// 创建会话
    ///
    /// # 错误
    ///
    /// - `InvalidArgument`: 配置校验失败
    pub fn start(config: NavigationConfig, collaborators: Collaborators) -> Result<Self> {
        config
            .validate()
            .map_err(|err| MotionError::invalid_argument("config", err.to_string()))?;

        let arbiter = CommandArbiter::new(
            config.topology(),
            config.speeds.clone(),
            collaborators.actuation,
        );
        info!("Navigation session started (body type {})", config.body_type);

        Ok(Session {
            config,
            arbiter,
            localization: collaborators.localization,
            obstacle: collaborators.obstacle,
            kinematics: collaborators.kinematics,
            pose_seq: AtomicU32::new(0),
        })
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn arbiter(&self) -> &CommandArbiter {
        &self.arbiter
    }

    /// 执行槽状态快照
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.arbiter.tracker().snapshot()
    }

    /// 提交任意运动命令（路径命令交给路径跟随器）
    pub fn submit(&self, command: MotionCommand) -> Result<Outcome> {
        match command {
            MotionCommand::FollowPath(path) => self.follow_path(&path).map(Outcome::Path),
            other => self.arbiter.submit(other).map(Outcome::Dispatched),
        }
    }

    /// 沿路径行走
    pub fn follow_path(&self, path: &[PoseStamped]) -> Result<PathOutcome> {
        PathFollower::new(&self.arbiter, self.obstacle.as_ref(), self.config.path.clone()).follow(path)
    }

    /// 停止行走
    pub fn move_stop(&self) -> Result<()> {
        self.arbiter.move_stop()
    }

    /// 当前全局位姿
    pub fn global_pose(&self) -> Result<PoseStamped> {
        let pose = self
            .localization
            .current_global_pose()
            .inspect_err(|err| warn!("Global pose unavailable: {}", err))?;
        let seq = self.pose_seq.fetch_add(1, Ordering::Relaxed);
        Ok(PoseStamped::global(seq, pose))
    }

    /// 写入真实位姿，返回定位模块是否接受
    pub fn set_global_pose(&self, pose: &Pose) -> Result<bool> {
        if !pose.is_finite() {
            return Err(MotionError::invalid_argument("pose", "must be finite"));
        }
        let accepted = self.localization.set_global_pose(pose)?;
        if accepted {
            debug!("Global pose set to {}", pose);
        } else {
            warn!("Localization rejected global pose {}", pose);
        }
        Ok(accepted)
    }

    /// 链或关节在指定空间中的当前变换（每次重新计算）
    pub fn transform(&self, name: &str, space: Space) -> Result<Matrix4<f64>> {
        let selector = self.arbiter.topology().resolve(name)?;
        self.kinematics.transform(selector, space)
    }

    /// 全局坐标系中的点转换到机器人坐标系
    pub fn to_robot_frame(&self, global: &Point3<f64>) -> Result<Point3<f64>> {
        if !global.coords.iter().all(|c| c.is_finite()) {
            return Err(MotionError::invalid_argument("target", "coordinates must be finite"));
        }
        let robot = self.localization.current_global_pose()?;
        Ok(robot.inverse_transform_point(global))
    }

    /// 手臂指向全局坐标系中的点
    pub fn point_arm_at(&self, global: &Point3<f64>) -> Result<Dispatch> {
        let target = self.to_robot_frame(global)?;
        self.arbiter.submit(MotionCommand::ArmPoint { target })
    }

    /// 头部注视全局坐标系中的点
    pub fn look_at(&self, global: &Point3<f64>) -> Result<Dispatch> {
        let target = self.to_robot_frame(global)?;
        self.arbiter.submit(MotionCommand::GazePoint { target })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.arbiter.teardown();
        info!("Navigation session closed");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("arbiter", &self.arbiter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ActuationIntent, DispatchStatus, ExecutionSlot};
    use crate::sim::SimulatedRobot;
    use approx::assert_relative_eq;
    use strider_tools::SpeedSettings;
    use strider_types::{BodyType, Chain, Frame, Rad};

    fn session() -> (Session, Arc<SimulatedRobot>) {
        let sim = Arc::new(SimulatedRobot::new());
        let session = Session::start(NavigationConfig::default(), Collaborators::from_robot(sim.clone()))
            .unwrap();
        (session, sim)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sim = Arc::new(SimulatedRobot::new());
        let config = NavigationConfig {
            speeds: SpeedSettings {
                rest: 0.0,
                ..SpeedSettings::default()
            },
            ..NavigationConfig::default()
        };
        let err = Session::start(config, Collaborators::from_robot(sim)).unwrap_err();
        assert!(matches!(err, MotionError::InvalidArgument { param: "config", .. }));
    }

    #[test]
    fn test_submit_routes_paths() {
        let (session, sim) = session();
        let path = vec![PoseStamped::global(0, Pose::planar(1.0, 0.0, Rad::ZERO))];
        let outcome = session.submit(MotionCommand::FollowPath(path)).unwrap();
        assert_eq!(outcome, Outcome::Path(PathOutcome::Completed { reached: 1 }));

        let outcome = session.submit(MotionCommand::velocity(0.2, 0.0, 0.0)).unwrap();
        assert!(matches!(
            outcome,
            Outcome::Dispatched(Dispatch {
                status: DispatchStatus::Started,
                ..
            })
        ));
        assert_eq!(sim.execute_count(), 2);
    }

    #[test]
    fn test_global_pose_roundtrip() {
        let (session, sim) = session();
        let pose = Pose::planar(2.0, 1.0, Rad(0.3));
        assert!(session.set_global_pose(&pose).unwrap());

        let first = session.global_pose().unwrap();
        let second = session.global_pose().unwrap();
        assert!(first.pose.approx_eq(&pose, 1e-9));
        assert_eq!(first.frame(), Frame::Global);
        assert!(second.header.seq > first.header.seq);

        sim.set_localization(None);
        assert_eq!(session.global_pose().unwrap_err(), MotionError::LocalizationUnavailable);
    }

    #[test]
    fn test_set_global_pose_rejections() {
        let (session, sim) = session();
        let bad = Pose::planar(f64::NAN, 0.0, Rad::ZERO);
        assert!(session.set_global_pose(&bad).unwrap_err().is_validation());

        sim.set_accept_pose_updates(false);
        assert!(!session.set_global_pose(&Pose::identity()).unwrap());
    }

    #[test]
    fn test_transform_by_name() {
        let (session, _sim) = session();
        let head = session.transform("Head", Space::Torso).unwrap();
        let yaw = session.transform("HeadYaw", Space::Torso).unwrap();
        assert_eq!(head, yaw);

        assert_eq!(
            session.transform("Tail", Space::Robot).unwrap_err(),
            MotionError::UnsupportedJoint("Tail".into())
        );
    }

    #[test]
    fn test_transform_unavailable_joint_on_h21() {
        let sim = Arc::new(SimulatedRobot::new());
        let config = NavigationConfig {
            body_type: BodyType::H21,
            ..NavigationConfig::default()
        };
        let session = Session::start(config, Collaborators::from_robot(sim)).unwrap();
        assert!(matches!(
            session.transform("LWristYaw", Space::Torso),
            Err(MotionError::UnsupportedJoint(_))
        ));
    }

    #[test]
    fn test_global_targets_mapped_to_robot_frame() {
        let (session, sim) = session();
        // 机器人在 (1, 1)，朝向 +y
        sim.set_localization(Some(Pose::planar(1.0, 1.0, Rad(std::f64::consts::FRAC_PI_2))));

        // 全局 (0, 2) 在机器人前方 1 米、左侧 1 米
        session.point_arm_at(&Point3::new(0.0, 2.0, 0.5)).unwrap();
        session.look_at(&Point3::new(2.0, 2.0, 0.5)).unwrap();

        let executed = sim.executed();
        match &executed[0] {
            ActuationIntent::PointArm { chain, target, .. } => {
                assert_eq!(*chain, Chain::LArm);
                assert_relative_eq!(target.x, 1.0, epsilon = 1e-9);
                assert_relative_eq!(target.y, 1.0, epsilon = 1e-9);
            },
            other => panic!("unexpected intent {:?}", other),
        }
        match &executed[1] {
            ActuationIntent::LookAt { target, .. } => {
                assert_relative_eq!(target.x, 1.0, epsilon = 1e-9);
                assert_relative_eq!(target.y, -1.0, epsilon = 1e-9);
            },
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_pointing_requires_localization() {
        let (session, sim) = session();
        sim.set_localization(None);
        assert_eq!(
            session.point_arm_at(&Point3::new(1.0, 0.0, 0.0)).unwrap_err(),
            MotionError::LocalizationUnavailable
        );
        assert!(!sim.was_contacted());
    }

    #[test]
    fn test_drop_stops_background_motion() {
        let (session, sim) = session();
        session.submit(MotionCommand::velocity(0.5, 0.0, 0.0)).unwrap();
        drop(session);
        assert_eq!(sim.stop_count(), 1);
        assert_eq!(
            sim.calls().last(),
            Some(&crate::sim::ActuationCall::Stop(ExecutionSlot::Locomotion))
        );
    }
}
