//! 关节拓扑
//!
//! 描述机器人的运动链、关节、共用电机的关节组，以及各机型的关节可用性。
//!
//! | 链    | 关节                                                                           |
//! |-------|--------------------------------------------------------------------------------|
//! | Head  | HeadYaw, HeadPitch                                                             |
//! | LArm  | LShoulderPitch, LShoulderRoll, LElbowYaw, LElbowRoll, LWristYaw¹, LHand¹       |
//! | LLeg  | LHipYawPitch², LHipRoll, LHipPitch, LKneePitch, LAnklePitch, LAnkleRoll        |
//! | RLeg  | RHipYawPitch², RHipRoll, RHipPitch, RKneePitch, RAnklePitch, RAnkleRoll        |
//! | RArm  | RShoulderPitch, RShoulderRoll, RElbowYaw, RElbowRoll, RWristYaw¹, RHand¹       |
//!
//! ¹ H21 机型不存在这些关节。
//! ² LHipYawPitch 与 RHipYawPitch 共用同一个电机，冲突时 LHipYawPitch 优先。

use crate::error::TopologyError;
use crate::units::{Rad, SpeedFraction};
use std::fmt;
use std::str::FromStr;

/// 关节名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JointName {
    HeadYaw,
    HeadPitch,
    LShoulderPitch,
    LShoulderRoll,
    LElbowYaw,
    LElbowRoll,
    LWristYaw,
    LHand,
    LHipYawPitch,
    LHipRoll,
    LHipPitch,
    LKneePitch,
    LAnklePitch,
    LAnkleRoll,
    RHipYawPitch,
    RHipRoll,
    RHipPitch,
    RKneePitch,
    RAnklePitch,
    RAnkleRoll,
    RShoulderPitch,
    RShoulderRoll,
    RElbowYaw,
    RElbowRoll,
    RWristYaw,
    RHand,
}

impl JointName {
    /// 所有关节（按链顺序）
    pub const ALL: [JointName; 26] = [
        JointName::HeadYaw,
        JointName::HeadPitch,
        JointName::LShoulderPitch,
        JointName::LShoulderRoll,
        JointName::LElbowYaw,
        JointName::LElbowRoll,
        JointName::LWristYaw,
        JointName::LHand,
        JointName::LHipYawPitch,
        JointName::LHipRoll,
        JointName::LHipPitch,
        JointName::LKneePitch,
        JointName::LAnklePitch,
        JointName::LAnkleRoll,
        JointName::RHipYawPitch,
        JointName::RHipRoll,
        JointName::RHipPitch,
        JointName::RKneePitch,
        JointName::RAnklePitch,
        JointName::RAnkleRoll,
        JointName::RShoulderPitch,
        JointName::RShoulderRoll,
        JointName::RElbowYaw,
        JointName::RElbowRoll,
        JointName::RWristYaw,
        JointName::RHand,
    ];

    /// 关节名称字符串
    pub const fn name(self) -> &'static str {
        match self {
            JointName::HeadYaw => "HeadYaw",
            JointName::HeadPitch => "HeadPitch",
            JointName::LShoulderPitch => "LShoulderPitch",
            JointName::LShoulderRoll => "LShoulderRoll",
            JointName::LElbowYaw => "LElbowYaw",
            JointName::LElbowRoll => "LElbowRoll",
            JointName::LWristYaw => "LWristYaw",
            JointName::LHand => "LHand",
            JointName::LHipYawPitch => "LHipYawPitch",
            JointName::LHipRoll => "LHipRoll",
            JointName::LHipPitch => "LHipPitch",
            JointName::LKneePitch => "LKneePitch",
            JointName::LAnklePitch => "LAnklePitch",
            JointName::LAnkleRoll => "LAnkleRoll",
            JointName::RHipYawPitch => "RHipYawPitch",
            JointName::RHipRoll => "RHipRoll",
            JointName::RHipPitch => "RHipPitch",
            JointName::RKneePitch => "RKneePitch",
            JointName::RAnklePitch => "RAnklePitch",
            JointName::RAnkleRoll => "RAnkleRoll",
            JointName::RShoulderPitch => "RShoulderPitch",
            JointName::RShoulderRoll => "RShoulderRoll",
            JointName::RElbowYaw => "RElbowYaw",
            JointName::RElbowRoll => "RElbowRoll",
            JointName::RWristYaw => "RWristYaw",
            JointName::RHand => "RHand",
        }
    }

    /// 所属的运动链
    pub const fn chain(self) -> Chain {
        match self {
            JointName::HeadYaw | JointName::HeadPitch => Chain::Head,
            JointName::LShoulderPitch
            | JointName::LShoulderRoll
            | JointName::LElbowYaw
            | JointName::LElbowRoll
            | JointName::LWristYaw
            | JointName::LHand => Chain::LArm,
            JointName::LHipYawPitch
            | JointName::LHipRoll
            | JointName::LHipPitch
            | JointName::LKneePitch
            | JointName::LAnklePitch
            | JointName::LAnkleRoll => Chain::LLeg,
            JointName::RHipYawPitch
            | JointName::RHipRoll
            | JointName::RHipPitch
            | JointName::RKneePitch
            | JointName::RAnklePitch
            | JointName::RAnkleRoll => Chain::RLeg,
            JointName::RShoulderPitch
            | JointName::RShoulderRoll
            | JointName::RElbowYaw
            | JointName::RElbowRoll
            | JointName::RWristYaw
            | JointName::RHand => Chain::RArm,
        }
    }
}

impl fmt::Display for JointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for JointName {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointName::ALL
            .iter()
            .copied()
            .find(|j| j.name() == s)
            .ok_or_else(|| TopologyError::UnknownName(s.to_string()))
    }
}

/// 运动链
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Chain {
    Head,
    LArm,
    LLeg,
    RLeg,
    RArm,
}

impl Chain {
    /// 所有链
    pub const ALL: [Chain; 5] = [Chain::Head, Chain::LArm, Chain::LLeg, Chain::RLeg, Chain::RArm];

    /// 链名称字符串
    pub const fn name(self) -> &'static str {
        match self {
            Chain::Head => "Head",
            Chain::LArm => "LArm",
            Chain::LLeg => "LLeg",
            Chain::RLeg => "RLeg",
            Chain::RArm => "RArm",
        }
    }

    /// 链上的全部关节（不考虑机型）
    pub const fn joints(self) -> &'static [JointName] {
        match self {
            Chain::Head => &[JointName::HeadYaw, JointName::HeadPitch],
            Chain::LArm => &[
                JointName::LShoulderPitch,
                JointName::LShoulderRoll,
                JointName::LElbowYaw,
                JointName::LElbowRoll,
                JointName::LWristYaw,
                JointName::LHand,
            ],
            Chain::LLeg => &[
                JointName::LHipYawPitch,
                JointName::LHipRoll,
                JointName::LHipPitch,
                JointName::LKneePitch,
                JointName::LAnklePitch,
                JointName::LAnkleRoll,
            ],
            Chain::RLeg => &[
                JointName::RHipYawPitch,
                JointName::RHipRoll,
                JointName::RHipPitch,
                JointName::RKneePitch,
                JointName::RAnklePitch,
                JointName::RAnkleRoll,
            ],
            Chain::RArm => &[
                JointName::RShoulderPitch,
                JointName::RShoulderRoll,
                JointName::RElbowYaw,
                JointName::RElbowRoll,
                JointName::RWristYaw,
                JointName::RHand,
            ],
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Chain {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| TopologyError::UnknownName(s.to_string()))
    }
}

/// 机型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyType {
    /// 无腕关节和手的机型
    H21,
    /// 完整机型
    #[default]
    H25,
}

impl BodyType {
    /// 本机型上不存在的关节
    pub const fn missing_joints(self) -> &'static [JointName] {
        match self {
            BodyType::H21 => &[
                JointName::LWristYaw,
                JointName::LHand,
                JointName::RWristYaw,
                JointName::RHand,
            ],
            BodyType::H25 => &[],
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyType::H21 => write!(f, "H21"),
            BodyType::H25 => write!(f, "H25"),
        }
    }
}

impl FromStr for BodyType {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H21" => Ok(BodyType::H21),
            "H25" => Ok(BodyType::H25),
            _ => Err(TopologyError::UnknownBodyType(s.to_string())),
        }
    }
}

/// 名称解析结果：单个关节或整条链
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointSelector {
    /// 单个关节
    Joint(JointName),
    /// 整条链
    Chain(Chain),
}

/// 关节目标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTarget {
    /// 关节
    pub joint: JointName,
    /// 目标角度
    pub angle: Rad,
    /// 速度比例
    pub speed: SpeedFraction,
}

impl JointTarget {
    pub fn new(joint: JointName, angle: Rad, speed: SpeedFraction) -> Self {
        JointTarget {
            joint,
            angle,
            speed,
        }
    }
}

/// 共用同一电机的关节组
///
/// 两个关节同时出现在一次请求中且角度冲突时，`primary` 的角度生效，
/// `secondary` 的请求值被静默覆盖。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoupledJointGroup {
    /// 优先关节
    pub primary: JointName,
    /// 被覆盖的关节
    pub secondary: JointName,
}

/// 髋部 YawPitch 关节组
pub const HIP_YAW_PITCH: CoupledJointGroup = CoupledJointGroup {
    primary: JointName::LHipYawPitch,
    secondary: JointName::RHipYawPitch,
};

impl CoupledJointGroup {
    /// 关节是否属于本组
    pub fn contains(&self, joint: JointName) -> bool {
        joint == self.primary || joint == self.secondary
    }

    /// 对一组关节目标应用优先级规则
    ///
    /// 返回被覆盖的 `secondary` 原始角度（没有冲突时返回 `None`）。
    pub fn resolve(&self, targets: &mut [JointTarget]) -> Option<Rad> {
        let primary_angle = targets
            .iter()
            .find(|t| t.joint == self.primary)
            .map(|t| t.angle)?;

        let mut overridden = None;
        for target in targets.iter_mut().filter(|t| t.joint == self.secondary) {
            if target.angle != primary_angle {
                overridden = Some(target.angle);
                target.angle = primary_angle;
            }
        }
        overridden
    }
}

/// 当前机型的关节拓扑
///
/// 无状态，可在线程间随意共享。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JointTopology {
    body_type: BodyType,
}

impl JointTopology {
    /// 创建指定机型的拓扑
    pub const fn new(body_type: BodyType) -> Self {
        JointTopology { body_type }
    }

    /// 当前机型
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// 关节在当前机型上是否存在
    pub fn is_available(&self, joint: JointName) -> bool {
        !self.body_type.missing_joints().contains(&joint)
    }

    /// 链上当前机型可用的关节（按链顺序）
    pub fn chain_joints(&self, chain: Chain) -> impl Iterator<Item = JointName> + '_ {
        chain
            .joints()
            .iter()
            .copied()
            .filter(move |j| self.is_available(*j))
    }

    /// 解析关节或链名称
    ///
    /// # 错误
    ///
    /// - `TopologyError::UnknownName`: 既不是关节也不是链
    /// - `TopologyError::Unavailable`: 关节在当前机型上不存在
    pub fn resolve(&self, name: &str) -> Result<JointSelector, TopologyError> {
        if let Ok(chain) = name.parse::<Chain>() {
            return Ok(JointSelector::Chain(chain));
        }

        let joint = name.parse::<JointName>()?;
        if !self.is_available(joint) {
            return Err(TopologyError::Unavailable {
                joint,
                body_type: self.body_type,
            });
        }
        Ok(JointSelector::Joint(joint))
    }

    /// 将关节/链名称列表展开为关节列表
    ///
    /// 链展开为其可用关节。任一名称无效时整体失败，不返回部分结果。
    pub fn expand<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<JointName>, TopologyError> {
        let mut joints = Vec::with_capacity(names.len());
        for name in names {
            match self.resolve(name.as_ref())? {
                JointSelector::Joint(joint) => joints.push(joint),
                JointSelector::Chain(chain) => joints.extend(self.chain_joints(chain)),
            }
        }
        Ok(joints)
    }
}
