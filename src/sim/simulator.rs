//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::{Event, EventId};
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    cancelled: HashSet<u64>,
    /// `stop_at` 设定的截止时间；超过它的事件不会被执行
    stop_at: Option<SimTime>,
    halted: bool,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行（且未取消）的事件数
    pub fn pending(&self) -> usize {
        self.q.len().saturating_sub(self.cancelled.len())
    }

    /// 调度事件在指定时间执行
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventId {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at: at.max(self.now),
            seq,
            ev: Box::new(ev),
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
        EventId(seq)
    }

    /// 相对当前时间调度事件
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) -> EventId {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev)
    }

    /// 取消一个尚未执行的事件；已执行或不存在的 id 返回 false。
    pub fn cancel(&mut self, id: EventId) -> bool {
        if id.0 >= self.next_seq || !self.q.iter().any(|e| e.seq == id.0) {
            return false;
        }
        trace!(seq = id.0, "取消事件");
        self.cancelled.insert(id.0)
    }

    /// 设定仿真截止时间，之后的 `run` 不会越过它。
    pub fn stop_at(&mut self, at: SimTime) {
        self.stop_at = Some(at);
    }

    /// 立即停止：当前事件执行完后 `run`/`run_until` 返回。
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// 丢弃所有待执行事件（仿真结束后的清理）。
    pub fn destroy(&mut self) {
        debug!(dropped = self.q.len(), "清空事件队列");
        self.q.clear();
        self.cancelled.clear();
    }

    /// 运行直到事件队列为空或到达 `until`（包含恰好在 `until` 的事件）。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        self.drain(until, world);
        if !self.halted {
            self.now = self.now.max(until);
        }
    }

    /// 运行所有事件直到队列为空、到达 `stop_at` 或被 `halt`。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let until = self.stop_at.unwrap_or(SimTime::MAX);
        let event_count = self.drain(until, world);
        if let Some(stop) = self.stop_at {
            if !self.halted {
                self.now = self.now.max(stop);
            }
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            halted = self.halted,
            "✅ 仿真完成"
        );
    }

    fn drain(&mut self, until: SimTime, world: &mut dyn World) -> u64 {
        let mut event_count = 0;
        while !self.halted {
            match self.q.peek() {
                Some(top) if top.at <= until => {}
                _ => break,
            }
            let Some(item) = self.q.pop() else { break };
            if self.cancelled.remove(&item.seq) {
                trace!(seq = item.seq, "跳过已取消事件");
                continue;
            }
            event_count += 1;
            self.now = item.at;

            trace!(
                event_num = event_count,
                now = ?self.now,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
        }
        event_count
    }
}
