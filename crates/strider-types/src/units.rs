//! 强类型单位
//!
//! - [`Rad`]: 关节角度（弧度）
//! - [`SpeedFraction`]: 最大关节速度的比例，始终位于 `[0, 1]`
//!
//! # 示例
//!
//! ```rust
//! use strider_types::{Rad, SpeedFraction};
//!
//! let angle = Rad(std::f64::consts::PI * 3.0).normalize();
//! assert!((angle.0.abs() - std::f64::consts::PI).abs() < 1e-9);
//!
//! // 超出范围的速度会被截断
//! assert_eq!(SpeedFraction::new(1.7).value(), 1.0);
//! assert!(SpeedFraction::new(0.0).is_zero());
//! ```

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 弧度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rad(pub f64);

impl Rad {
    /// 零弧度
    pub const ZERO: Self = Rad(0.0);

    /// 创建新的弧度值
    #[inline]
    pub const fn new(value: f64) -> Self {
        Rad(value)
    }

    /// 从角度创建
    #[inline]
    pub fn from_deg(deg: f64) -> Self {
        Rad(deg.to_radians())
    }

    /// 转换为角度值
    #[inline]
    pub fn to_deg(self) -> f64 {
        self.0.to_degrees()
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 是否为有限值（非 NaN / Inf）
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// 归一化到 [-π, π]
    pub fn normalize(self) -> Self {
        let mut angle = self.0 % std::f64::consts::TAU;
        if angle > std::f64::consts::PI {
            angle -= std::f64::consts::TAU;
        } else if angle < -std::f64::consts::PI {
            angle += std::f64::consts::TAU;
        }
        Rad(angle)
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

impl Add for Rad {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Rad(self.0 + rhs.0)
    }
}

impl Sub for Rad {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Rad(self.0 - rhs.0)
    }
}

impl Mul<f64> for Rad {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Rad(self.0 * rhs)
    }
}

impl Neg for Rad {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Rad(-self.0)
    }
}

impl From<f64> for Rad {
    fn from(value: f64) -> Self {
        Rad(value)
    }
}

/// 速度比例（NewType）
///
/// 1.0 表示最大速度，0.0 表示不运动。构造时截断到 `[0, 1]`。
/// NaN 不会被截断，由调用方通过 [`SpeedFraction::is_finite`] 拒绝。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedFraction(f64);

impl SpeedFraction {
    /// 不运动
    pub const ZERO: Self = SpeedFraction(0.0);

    /// 最大速度
    pub const MAX: Self = SpeedFraction(1.0);

    /// 创建速度比例（截断到 `[0, 1]`）
    #[inline]
    pub fn new(value: f64) -> Self {
        SpeedFraction(value.clamp(0.0, 1.0))
    }

    /// 获取原始值
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 是否为 0（请求不产生运动）
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// 是否为有限值
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Default for SpeedFraction {
    fn default() -> Self {
        SpeedFraction::MAX
    }
}

impl fmt::Display for SpeedFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}
