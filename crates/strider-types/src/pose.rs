//! 位姿与坐标系
//!
//! 提供 3D 位姿（位置 + 姿态）及坐标系之间的齐次变换。
//!
//! # 坐标系约定
//!
//! - **Global**：地图/世界坐标系，由定位模块维护
//! - **Robot**：机器人本体坐标系，原点位于两脚之间的地面投影，x 轴朝前，y 轴朝左，z 轴朝上
//!
//! # 示例
//!
//! ```rust
//! use strider_types::{Pose, Rad};
//! use nalgebra::Point3;
//!
//! // 机器人位于 (1, 0)，朝向 +y
//! let robot = Pose::planar(1.0, 0.0, Rad(std::f64::consts::FRAC_PI_2));
//!
//! // 全局坐标系中的点 (1, 1, 0) 在机器人正前方 1 米
//! let local = robot.inverse_transform_point(&Point3::new(1.0, 1.0, 0.0));
//! assert!((local.x - 1.0).abs() < 1e-9);
//! assert!(local.y.abs() < 1e-9);
//! ```

use crate::units::Rad;
use nalgebra::{Isometry3, Matrix3, Matrix4, Point3, Rotation3, Translation3, UnitQuaternion};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 位姿所在的坐标系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Frame {
    /// 全局（地图）坐标系
    #[default]
    Global,
    /// 机器人本体坐标系
    Robot,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Global => write!(f, "global"),
            Frame::Robot => write!(f, "robot"),
        }
    }
}

/// 运动学变换查询使用的空间
///
/// 整数取值与机器人端约定一致（0 = Torso, 1 = World, 2 = Robot）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum Space {
    /// 躯干坐标系
    Torso = 0,
    /// 世界坐标系（上电时的机器人位置）
    World = 1,
    /// 机器人坐标系
    Robot = 2,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Space::Torso => "torso",
            Space::World => "world",
            Space::Robot => "robot",
        };
        write!(f, "{}", name)
    }
}

/// 3D 位姿
///
/// 不可变值类型，内部以刚体变换（`Isometry3`）存储。
/// 平面运动只使用 `x`、`y` 和绕 z 轴的 `theta`。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    iso: Isometry3<f64>,
}

impl Pose {
    /// 由位置和姿态四元数创建
    pub fn new(x: f64, y: f64, z: f64, orientation: UnitQuaternion<f64>) -> Self {
        Pose {
            iso: Isometry3::from_parts(Translation3::new(x, y, z), orientation),
        }
    }

    /// 单位位姿（原点，无旋转）
    pub fn identity() -> Self {
        Pose {
            iso: Isometry3::identity(),
        }
    }

    /// 平面位姿：地面上的 `(x, y)` 和朝向 `theta`
    pub fn planar(x: f64, y: f64, theta: Rad) -> Self {
        Self::new(
            x,
            y,
            0.0,
            UnitQuaternion::from_euler_angles(0.0, 0.0, theta.0),
        )
    }

    /// 由位置和欧拉角（Roll-Pitch-Yaw）创建
    pub fn from_position_euler(x: f64, y: f64, z: f64, roll: Rad, pitch: Rad, yaw: Rad) -> Self {
        Self::new(
            x,
            y,
            z,
            UnitQuaternion::from_euler_angles(roll.0, pitch.0, yaw.0),
        )
    }

    /// 只有位置、没有旋转的位姿
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, UnitQuaternion::identity())
    }

    /// 由齐次变换矩阵创建
    ///
    /// 旋转部分被重新正交化；最后一行不是 `[0, 0, 0, 1]` 时返回 `None`。
    pub fn from_homogeneous(matrix: &Matrix4<f64>) -> Option<Self> {
        let last_row_ok = matrix[(3, 0)].abs() < 1e-9
            && matrix[(3, 1)].abs() < 1e-9
            && matrix[(3, 2)].abs() < 1e-9
            && (matrix[(3, 3)] - 1.0).abs() < 1e-9;
        if !last_row_ok {
            return None;
        }

        let rotation: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let rotation = Rotation3::from_matrix(&rotation);
        Some(Pose {
            iso: Isometry3::from_parts(
                Translation3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]),
                UnitQuaternion::from_rotation_matrix(&rotation),
            ),
        })
    }

    /// X 坐标（米）
    #[inline]
    pub fn x(&self) -> f64 {
        self.iso.translation.x
    }

    /// Y 坐标（米）
    #[inline]
    pub fn y(&self) -> f64 {
        self.iso.translation.y
    }

    /// Z 坐标（米）
    #[inline]
    pub fn z(&self) -> f64 {
        self.iso.translation.z
    }

    /// 位置
    pub fn position(&self) -> Point3<f64> {
        Point3::from(self.iso.translation.vector)
    }

    /// 姿态
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.iso.rotation
    }

    /// 绕 z 轴的朝向（平面 theta）
    pub fn theta(&self) -> Rad {
        let (_, _, yaw) = self.iso.rotation.euler_angles();
        Rad(yaw)
    }

    /// 底层刚体变换
    pub fn isometry(&self) -> &Isometry3<f64> {
        &self.iso
    }

    /// 位姿复合：`self ∘ other`
    ///
    /// `other` 表示在 `self` 坐标系下的位姿，结果位于 `self` 的父坐标系。
    pub fn compose(&self, other: &Pose) -> Pose {
        Pose {
            iso: self.iso * other.iso,
        }
    }

    /// 逆变换
    pub fn inverse(&self) -> Pose {
        Pose {
            iso: self.iso.inverse(),
        }
    }

    /// 以 `base` 为参考系表达 `self`
    ///
    /// 两者须位于同一父坐标系。
    pub fn relative_to(&self, base: &Pose) -> Pose {
        Pose {
            iso: base.iso.inverse() * self.iso,
        }
    }

    /// 将本坐标系下的点变换到父坐标系
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.iso.transform_point(point)
    }

    /// 将父坐标系下的点变换到本坐标系
    pub fn inverse_transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.iso.inverse_transform_point(point)
    }

    /// 4×4 齐次变换矩阵
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        self.iso.to_homogeneous()
    }

    /// 在容差内比较两个位姿
    ///
    /// 位置差（米）与姿态夹角（弧度）都不超过 `tolerance` 时返回 true。
    pub fn approx_eq(&self, other: &Pose, tolerance: f64) -> bool {
        let dp = (self.iso.translation.vector - other.iso.translation.vector).norm();
        // atan2 形式在小角度下比 acos 精确
        let delta = (self.iso.rotation.inverse() * other.iso.rotation).into_inner();
        let da = 2.0 * delta.imag().norm().atan2(delta.w.abs());
        dp <= tolerance && da <= tolerance
    }

    /// 所有分量是否为有限值
    pub fn is_finite(&self) -> bool {
        self.iso.translation.vector.iter().all(|v| v.is_finite())
            && self.iso.rotation.coords.iter().all(|v| v.is_finite())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::identity()
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose(x: {:.3}, y: {:.3}, z: {:.3}, theta: {})",
            self.x(),
            self.y(),
            self.z(),
            self.theta()
        )
    }
}

/// 位姿头信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoseHeader {
    /// 序号（路径中的顺序标识）
    pub seq: u32,
    /// 时间戳（自 UNIX 纪元）
    pub stamp: Duration,
    /// 所在坐标系
    pub frame: Frame,
}

impl PoseHeader {
    /// 使用当前系统时间创建
    pub fn now(seq: u32, frame: Frame) -> Self {
        PoseHeader {
            seq,
            stamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
            frame,
        }
    }
}

/// 带头信息的位姿（路径中的一个路点）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoseStamped {
    /// 头信息
    pub header: PoseHeader,
    /// 位姿
    pub pose: Pose,
}

impl PoseStamped {
    /// 创建带当前时间戳的位姿
    pub fn new(seq: u32, pose: Pose, frame: Frame) -> Self {
        PoseStamped {
            header: PoseHeader::now(seq, frame),
            pose,
        }
    }

    /// 全局坐标系下的位姿
    pub fn global(seq: u32, pose: Pose) -> Self {
        Self::new(seq, pose, Frame::Global)
    }

    /// 所在坐标系
    #[inline]
    pub fn frame(&self) -> Frame {
        self.header.frame
    }
}
