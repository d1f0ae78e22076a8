//! 路径跟随
//!
//! 按顺序把每个路点作为阻塞目标位姿命令下发。整条路径独占 Locomotion；
//! 每个路点之前轮询一次障碍物信号，检测到障碍物或路径被停止时返回
//! [`PathOutcome::Aborted`]。

use crate::arbiter::CommandArbiter;
use crate::error::{MotionError, Result};
use crate::interfaces::ObstacleSignal;
use strider_tools::PathSettings;
use strider_types::PoseStamped;
use tracing::{debug, info, warn};

/// 路径跟随结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    /// 所有路点均已到达
    Completed {
        /// 到达的路点数
        reached: usize,
    },
    /// 因障碍物或 `move_stop` 中止
    Aborted {
        /// 最后到达的路点下标（一个都未到达时为 `None`）
        last_reached: Option<usize>,
    },
}

impl PathOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PathOutcome::Completed { .. })
    }
}

/// 路径跟随器
pub struct PathFollower<'a> {
    arbiter: &'a CommandArbiter,
    obstacle: &'a dyn ObstacleSignal,
    settings: PathSettings,
}

impl<'a> PathFollower<'a> {
    pub fn new(
        arbiter: &'a CommandArbiter,
        obstacle: &'a dyn ObstacleSignal,
        settings: PathSettings,
    ) -> Self {
        PathFollower {
            arbiter,
            obstacle,
            settings,
        }
    }

    /// 沿路径行走
    ///
    /// 整条路径期间 Locomotion 保持 `Blocking(FollowPath)`，路点之间也不空闲。
    /// 调用 [`move_stop`](CommandArbiter::move_stop) 后剩余路点不再下发，
    /// 返回 [`PathOutcome::Aborted`]。
    ///
    /// # 错误
    ///
    /// - `InvalidPath`: 空路径（未接触执行器）
    /// - `Busy`: Locomotion 正被占用
    /// - 任一路点的执行错误原样返回，剩余路点不再下发
    pub fn follow(&self, path: &[PoseStamped]) -> Result<PathOutcome> {
        if path.is_empty() {
            warn!("Rejected empty path");
            return Err(MotionError::InvalidPath("path contains no waypoints".into()));
        }

        let claim = self.arbiter.claim_path()?;
        info!("Following path with {} waypoints", path.len());
        for (index, waypoint) in path.iter().enumerate() {
            let last_reached = index.checked_sub(1);

            if self.obstacle.obstacle_present() {
                warn!(
                    "Obstacle detected before waypoint {}, stopping (last reached: {:?})",
                    index, last_reached
                );
                self.arbiter.move_stop()?;
                return Ok(PathOutcome::Aborted { last_reached });
            }
            if !claim.is_current() {
                info!("Path stopped before waypoint {} (last reached: {:?})", index, last_reached);
                return Ok(PathOutcome::Aborted { last_reached });
            }

            debug!(
                "Waypoint {}/{} (seq {}, {} frame): {}",
                index + 1,
                path.len(),
                waypoint.header.seq,
                waypoint.frame(),
                waypoint.pose
            );
            match self.arbiter.walk_waypoint(&claim, waypoint.pose, waypoint.frame()) {
                Ok(()) => {},
                Err(err) if !claim.is_current() => {
                    info!("Path stopped during waypoint {}: {}", index, err);
                    return Ok(PathOutcome::Aborted { last_reached });
                },
                Err(err) => {
                    warn!("Path aborted at waypoint {}: {}", index, err);
                    return Err(err);
                },
            }
        }

        if self.settings.check_obstacle_after_last && self.obstacle.obstacle_present() {
            warn!("Obstacle detected after reaching the final waypoint");
        }

        info!("Path completed");
        Ok(PathOutcome::Completed { reached: path.len() })
    }
}
