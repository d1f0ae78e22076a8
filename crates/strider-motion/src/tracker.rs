//! 执行跟踪器
//!
//! 记录每个执行槽当前是否有命令在执行，并实现槽级别的互斥规则。
//!
//! # 状态机
//!
//! ```text
//!            阻塞命令                  终止结果
//!   Idle ─────────────► Blocking ─────────────► Idle
//!    │                                           ▲
//!    │   速度命令         速度命令（替换）        │ stop
//!    └─────────────► Background ◄───────┘────────┘
//! ```
//!
//! - 阻塞命令要求所有目标槽都为 `Idle`，否则返回 `Busy`
//! - 速度命令在 `Blocking` 槽上返回 `Busy`，在 `Background` 槽上替换原命令
//! - `stop` 在任何状态下都把槽置为 `Idle`
//!
//! # 票据
//!
//! 每次占用分配一个递增票据。释放时票据不匹配（槽已被停止并重新占用）
//! 则忽略，迟到的完成信号不会覆盖新命令的状态。
//!
//! # 锁
//!
//! 槽表由 `parking_lot::Mutex` 保护，临界区只包含状态读写，
//! 等待完成信号时从不持锁。

use crate::command::{CommandKind, ExecutionSlot, SlotSet};
use crate::error::{MotionError, Result};
use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, trace};

/// 执行槽状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// 空闲
    #[default]
    Idle,
    /// 阻塞命令执行中
    Blocking(CommandKind),
    /// 后台命令执行中
    Background(CommandKind),
}

impl SlotState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SlotState::Idle)
    }

    /// 正在执行的命令类型
    pub fn active_kind(&self) -> Option<CommandKind> {
        match *self {
            SlotState::Idle => None,
            SlotState::Blocking(kind) | SlotState::Background(kind) => Some(kind),
        }
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Idle => write!(f, "Idle"),
            SlotState::Blocking(kind) => write!(f, "Blocking({})", kind),
            SlotState::Background(kind) => write!(f, "Background({})", kind),
        }
    }
}

/// 占用票据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotEntry {
    state: SlotState,
    ticket: u64,
}

impl Default for SlotEntry {
    fn default() -> Self {
        SlotEntry {
            state: SlotState::Idle,
            ticket: 0,
        }
    }
}

#[derive(Debug, Default)]
struct SlotTable {
    entries: [SlotEntry; 3],
    last_ticket: u64,
}

impl SlotTable {
    fn issue(&mut self) -> u64 {
        self.last_ticket += 1;
        self.last_ticket
    }
}

/// 所有执行槽的状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerSnapshot {
    pub locomotion: SlotState,
    pub arms: SlotState,
    pub head: SlotState,
}

impl TrackerSnapshot {
    /// 指定槽的状态
    pub fn get(&self, slot: ExecutionSlot) -> SlotState {
        match slot {
            ExecutionSlot::Locomotion => self.locomotion,
            ExecutionSlot::Arms => self.arms,
            ExecutionSlot::Head => self.head,
        }
    }

    /// 是否所有槽都空闲
    pub fn all_idle(&self) -> bool {
        ExecutionSlot::ALL.iter().all(|slot| self.get(*slot).is_idle())
    }
}

/// 槽状态变更记录，用于执行器拒绝时恢复原状态
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotClaim {
    slot: ExecutionSlot,
    ticket: u64,
    previous: SlotEntry,
}

impl SlotClaim {
    pub(crate) fn ticket(&self) -> Ticket {
        Ticket(self.ticket)
    }

    /// 变更前的状态
    pub(crate) fn previous(&self) -> SlotState {
        self.previous.state
    }
}

/// 执行跟踪器
///
/// 状态只能由 [`CommandArbiter`](crate::CommandArbiter) 修改，外部只读。
#[derive(Debug, Default)]
pub struct ExecutionTracker {
    table: Mutex<SlotTable>,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定槽的当前状态
    pub fn state(&self, slot: ExecutionSlot) -> SlotState {
        self.table.lock().entries[slot.index()].state
    }

    /// 所有槽的状态快照
    pub fn snapshot(&self) -> TrackerSnapshot {
        let table = self.table.lock();
        TrackerSnapshot {
            locomotion: table.entries[ExecutionSlot::Locomotion.index()].state,
            arms: table.entries[ExecutionSlot::Arms.index()].state,
            head: table.entries[ExecutionSlot::Head.index()].state,
        }
    }

    /// 为阻塞命令原子地占用一组槽
    ///
    /// 任一槽非空闲时返回 `Busy`，且不修改任何槽。
    pub(crate) fn acquire_blocking(
        &self,
        slots: &[ExecutionSlot],
        kind: CommandKind,
    ) -> Result<BlockingGuard<'_>> {
        let mut table = self.table.lock();

        for slot in slots {
            if let Some(active) = table.entries[slot.index()].state.active_kind() {
                return Err(MotionError::Busy {
                    slot: *slot,
                    active,
                });
            }
        }

        let ticket = table.issue();
        for slot in slots {
            table.entries[slot.index()] = SlotEntry {
                state: SlotState::Blocking(kind),
                ticket,
            };
        }
        drop(table);

        trace!("Acquired {:?} for {} (ticket {})", slots, kind, ticket);
        Ok(BlockingGuard {
            tracker: self,
            slots: SlotSet::from_slice(slots),
            ticket,
        })
    }

    /// 为非阻塞命令占用一个槽（替换已有的后台命令）
    pub(crate) fn acquire_background(
        &self,
        slot: ExecutionSlot,
        kind: CommandKind,
    ) -> Result<SlotClaim> {
        let mut table = self.table.lock();
        let previous = table.entries[slot.index()];

        if let SlotState::Blocking(active) = previous.state {
            return Err(MotionError::Busy { slot, active });
        }

        let ticket = table.issue();
        table.entries[slot.index()] = SlotEntry {
            state: SlotState::Background(kind),
            ticket,
        };

        trace!("{} -> Background({}) (ticket {})", slot, kind, ticket);
        Ok(SlotClaim {
            slot,
            ticket,
            previous,
        })
    }

    /// 撤销一次变更，恢复变更前的状态与票据（票据过期时忽略）
    pub(crate) fn revert(&self, claim: SlotClaim) -> bool {
        let mut table = self.table.lock();
        let entry = &mut table.entries[claim.slot.index()];
        if entry.ticket != claim.ticket {
            return false;
        }
        *entry = claim.previous;
        true
    }

    /// 释放一组槽（票据过期的槽保持不变）
    ///
    /// 返回实际释放的槽数。
    pub(crate) fn release(&self, slots: &[ExecutionSlot], ticket: Ticket) -> usize {
        let mut table = self.table.lock();
        let mut released = 0;
        for slot in slots {
            let entry = &mut table.entries[slot.index()];
            if entry.ticket == ticket.0 && !entry.state.is_idle() {
                entry.state = SlotState::Idle;
                released += 1;
            }
        }
        released
    }

    /// 票据是否仍持有全部槽（未被停止或重置）
    fn holds(&self, slots: &[ExecutionSlot], ticket: u64) -> bool {
        let table = self.table.lock();
        slots.iter().all(|slot| {
            let entry = &table.entries[slot.index()];
            entry.ticket == ticket && !entry.state.is_idle()
        })
    }

    /// 将槽置为空闲
    ///
    /// 分配新票据，使之前的占用全部过期。返回的记录可用于 [`revert`](Self::revert)。
    pub(crate) fn stop(&self, slot: ExecutionSlot) -> SlotClaim {
        let mut table = self.table.lock();
        let ticket = table.issue();
        let entry = &mut table.entries[slot.index()];
        let previous = *entry;
        *entry = SlotEntry {
            state: SlotState::Idle,
            ticket,
        };
        SlotClaim {
            slot,
            ticket,
            previous,
        }
    }

    /// 所有槽恢复空闲（会话结束）
    pub(crate) fn reset(&self) {
        let mut table = self.table.lock();
        let ticket = table.issue();
        for entry in table.entries.iter_mut() {
            *entry = SlotEntry {
                state: SlotState::Idle,
                ticket,
            };
        }
        debug!("Execution tracker reset");
    }
}

/// 阻塞占用守卫
///
/// 被丢弃时释放占用的槽，错误或 panic 路径同样生效。
#[must_use = "dropping the guard releases the slots immediately"]
#[derive(Debug)]
pub struct BlockingGuard<'a> {
    tracker: &'a ExecutionTracker,
    slots: SlotSet,
    ticket: u64,
}

impl BlockingGuard<'_> {
    pub fn ticket(&self) -> Ticket {
        Ticket(self.ticket)
    }

    pub fn slots(&self) -> &[ExecutionSlot] {
        &self.slots
    }

    /// 占用是否仍有效（期间没有 stop 或 reset）
    pub fn is_current(&self) -> bool {
        self.tracker.holds(&self.slots, self.ticket)
    }
}

impl Drop for BlockingGuard<'_> {
    fn drop(&mut self) {
        let released = self.tracker.release(&self.slots, Ticket(self.ticket));
        if released < self.slots.len() {
            trace!(
                "Ticket {} released {}/{} slots (others were stopped)",
                self.ticket,
                released,
                self.slots.len()
            );
        }
    }
}
