//! 预定义姿态

use crate::error::TopologyError;
use std::fmt;
use std::str::FromStr;

/// 预定义的全身姿态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Posture {
    StandInit,
    Stand,
    StandZero,
    LyingBack,
    LyingBelly,
    Crouch,
    Sit,
    SitRelax,
}

impl Posture {
    /// 所有姿态
    pub const ALL: [Posture; 8] = [
        Posture::StandInit,
        Posture::Stand,
        Posture::StandZero,
        Posture::LyingBack,
        Posture::LyingBelly,
        Posture::Crouch,
        Posture::Sit,
        Posture::SitRelax,
    ];

    /// 可以安全卸力（rest）的姿态
    pub const SAFE_FOR_REST: [Posture; 5] = [
        Posture::Crouch,
        Posture::Sit,
        Posture::SitRelax,
        Posture::LyingBelly,
        Posture::LyingBack,
    ];

    /// 姿态名称
    pub const fn name(self) -> &'static str {
        match self {
            Posture::StandInit => "StandInit",
            Posture::Stand => "Stand",
            Posture::StandZero => "StandZero",
            Posture::LyingBack => "LyingBack",
            Posture::LyingBelly => "LyingBelly",
            Posture::Crouch => "Crouch",
            Posture::Sit => "Sit",
            Posture::SitRelax => "SitRelax",
        }
    }

    /// 在此姿态下移除电机刚度是否安全
    ///
    /// 站立类姿态卸力会导致摔倒。
    pub const fn is_safe_for_rest(self) -> bool {
        matches!(
            self,
            Posture::Crouch
                | Posture::Sit
                | Posture::SitRelax
                | Posture::LyingBelly
                | Posture::LyingBack
        )
    }
}

impl fmt::Display for Posture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Posture {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Posture::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| TopologyError::UnknownPosture(s.to_string()))
    }
}
