//! # Strider Types
//!
//! 人形机器人运动控制的基础值类型（无状态，纯数据）：
//!
//! - `pose` - 位姿、坐标系与齐次变换
//! - `topology` - 运动链、关节、耦合关节组与机型可用性
//! - `posture` - 预定义姿态
//! - `units` - 强类型单位（弧度、速度比例）
//!
//! ## Feature Flags
//!
//! - `serde` - 为所有值类型启用 `Serialize`/`Deserialize`

pub mod error;
pub mod pose;
pub mod posture;
pub mod topology;
pub mod units;

pub use error::TopologyError;
pub use pose::{Frame, Pose, PoseHeader, PoseStamped, Space};
pub use posture::Posture;
pub use topology::{
    BodyType, Chain, CoupledJointGroup, HIP_YAW_PITCH, JointName, JointSelector, JointTarget,
    JointTopology,
};
pub use units::{Rad, SpeedFraction};

// nalgebra 类型出现在公共 API 中
pub use nalgebra;
