//! 测试辅助函数
//!
//! 提供快速创建测试环境的工具函数。

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strider_sdk::motion::ActuationIntent;
use strider_sdk::motion::sim::SimulatedRobot;
use strider_sdk::prelude::*;
use strider_sdk::types::JointTarget;

/// 快速创建标准测试环境（H25，默认配置）
pub fn setup_navigation() -> (Navigation, Arc<SimulatedRobot>) {
    setup_navigation_with_config(NavigationConfig::default())
}

/// 指定机型的测试环境
pub fn setup_navigation_with_body(body_type: BodyType) -> (Navigation, Arc<SimulatedRobot>) {
    setup_navigation_with_config(NavigationConfig {
        body_type,
        ..NavigationConfig::default()
    })
}

/// 使用自定义配置创建测试环境
pub fn setup_navigation_with_config(config: NavigationConfig) -> (Navigation, Arc<SimulatedRobot>) {
    Navigation::simulated(config).expect("default test config must be valid")
}

/// 沿 x 轴每隔 1 米一个路点的全局路径
pub fn straight_path(len: usize) -> Vec<PoseStamped> {
    (0..len)
        .map(|i| PoseStamped::global(i as u32, Pose::planar((i + 1) as f64, 0.0, Rad::ZERO)))
        .collect()
}

/// 等待条件满足
///
/// # 返回
///
/// 超时前满足返回 `true`
pub fn wait_for_condition<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// 等待模拟机器人挂起至少一个阻塞命令
pub fn wait_for_pending(robot: &SimulatedRobot) {
    assert!(
        wait_for_condition(Duration::from_secs(2), || robot.pending_count() > 0),
        "blocking command never reached the actuator"
    );
}

/// 提取关节意图中的目标
pub fn joint_targets(intent: &ActuationIntent) -> Vec<JointTarget> {
    match intent {
        ActuationIntent::Joints { targets } => targets.to_vec(),
        other => panic!("expected joint intent, got {:?}", other),
    }
}
