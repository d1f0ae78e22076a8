//! 配置驱动的会话测试

mod common;

use common::helpers::{joint_targets, setup_navigation_with_config};
use std::io::Write;
use strider_sdk::motion::ActuationIntent;
use strider_sdk::prelude::*;
use strider_sdk::types::nalgebra::Point3;
use tempfile::NamedTempFile;

const H21_CONFIG: &str = r#"
body_type = "H21"

[speeds]
default_joint = 0.15
rest = 0.35

[path]
check_obstacle_after_last = true
"#;

#[test]
fn test_session_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(H21_CONFIG.as_bytes()).unwrap();

    let config = NavigationConfig::load_from_file(file.path()).unwrap();
    let (nav, robot) = setup_navigation_with_config(config);

    assert_eq!(nav.session().config().body_type, BodyType::H21);
    assert!(!nav.move_joint(&["LHand"], &[0.5]));
    assert!(nav.move_joint(&["HeadYaw"], &[0.5]));

    let target = joint_targets(&robot.executed()[0])[0];
    assert_eq!(target.speed, SpeedFraction::new(0.15));
}

#[test]
fn test_configured_rest_speed() {
    let config = NavigationConfig::from_toml_str(H21_CONFIG).unwrap();
    let (nav, robot) = setup_navigation_with_config(config);
    assert!(nav.rest("Sit"));
    assert!(matches!(
        robot.executed()[0],
        ActuationIntent::Rest { posture: Posture::Sit, speed } if speed == SpeedFraction::new(0.35)
    ));
}

#[test]
fn test_final_obstacle_check_follows_config() {
    let config = NavigationConfig::from_toml_str(H21_CONFIG).unwrap();
    let (nav, robot) = setup_navigation_with_config(config);
    assert!(nav.move_along_path(&common::helpers::straight_path(2)));
    assert_eq!(robot.obstacle_polls(), 3);

    // 默认只在每个路点之前轮询
    let (nav, robot) = setup_navigation_with_config(NavigationConfig::default());
    assert!(nav.move_along_path(&common::helpers::straight_path(2)));
    assert_eq!(robot.obstacle_polls(), 2);
}

#[test]
fn test_configured_posture_speed() {
    let config = NavigationConfig::from_toml_str("[speeds]\nposture = 0.45\n").unwrap();
    let (nav, robot) = setup_navigation_with_config(config);
    assert!(nav.take_default_posture("Crouch"));
    assert!(nav.take_predefined_posture("Stand", 0.8));

    let executed = robot.executed();
    assert!(matches!(
        executed[0],
        ActuationIntent::Posture { posture: Posture::Crouch, speed } if speed == SpeedFraction::new(0.45)
    ));
    assert!(matches!(
        executed[1],
        ActuationIntent::Posture { posture: Posture::Stand, speed } if speed == SpeedFraction::new(0.8)
    ));
}

#[test]
fn test_configured_pointing_speed() {
    let config = NavigationConfig::from_toml_str("[speeds]\npointing = 0.9\n").unwrap();
    let (nav, robot) = setup_navigation_with_config(config);
    assert!(nav.session().point_arm_at(&Point3::new(1.0, 0.2, 0.5)).is_ok());
    assert!(matches!(
        robot.executed()[0],
        ActuationIntent::PointArm { speed, .. } if speed == SpeedFraction::new(0.9)
    ));
}

#[test]
fn test_invalid_config_rejected_by_session() {
    let config = NavigationConfig {
        speeds: strider_sdk::tools::SpeedSettings {
            gaze: 1.5,
            ..Default::default()
        },
        ..NavigationConfig::default()
    };
    let err = Navigation::simulated(config).unwrap_err();
    assert!(matches!(err, MotionError::InvalidArgument { param: "config", .. }));
}

#[test]
fn test_invalid_toml_rejected() {
    assert!(matches!(
        NavigationConfig::from_toml_str("body_type = \"H30\""),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        NavigationConfig::from_toml_str("[speeds]\ndefault_joint = 0.0"),
        Err(ConfigError::Invalid { field: "speeds.default_joint", .. })
    ));
}
