//! 节点移动模型
//!
//! 移动节点使用随机路点（random waypoint）模型：在矩形区域内随机选目标点，
//! 以 `[0, max_speed)` 内均匀抽取的速度直线前往，到达后停留 `pause`，再选下一个目标。
//! 静止节点按网格摆放。

use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::sim::SimTime;

/// 速度下限（m/s），避免抽到接近 0 的速度导致一段路程永远走不完
const MIN_SPEED_MPS: f64 = 0.1;

/// 二维坐标（米）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn lerp(&self, other: &Position, frac: f64) -> Position {
        Position {
            x: self.x + (other.x - self.x) * frac,
            y: self.y + (other.y - self.y) * frac,
        }
    }
}

/// 移动区域（以原点为左下角的矩形）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub width: f64,
    pub height: f64,
}

impl Area {
    fn random_point(&self, rng: &mut StdRng) -> Position {
        Position {
            x: uniform(rng, 0.0, self.width),
            y: uniform(rng, 0.0, self.height),
        }
    }
}

/// 网格摆放：先填满一行 `width` 个位置再换行
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub delta_x: f64,
    pub delta_y: f64,
    pub width: usize,
}

impl Grid {
    pub fn position(&self, index: usize) -> Position {
        let width = self.width.max(1);
        Position {
            x: (index % width) as f64 * self.delta_x,
            y: (index / width) as f64 * self.delta_y,
        }
    }
}

/// 节点的移动模型
#[derive(Debug, Clone)]
pub enum Mobility {
    Static(Position),
    RandomWaypoint(RandomWaypoint),
}

impl Mobility {
    /// 查询 `t` 时刻的位置。随机路点模型按需推进，要求查询时间单调不减。
    pub fn position_at(&mut self, t: SimTime) -> Position {
        match self {
            Mobility::Static(p) => *p,
            Mobility::RandomWaypoint(rw) => rw.position_at(t),
        }
    }
}

/// 随机路点模型的当前行程
#[derive(Debug, Clone)]
pub struct RandomWaypoint {
    area: Area,
    max_speed_mps: f64,
    pause: SimTime,
    rng: StdRng,
    from: Position,
    to: Position,
    depart: SimTime,
    arrive: SimTime,
    /// 停留结束、开始下一段行程的时间
    resume: SimTime,
}

impl RandomWaypoint {
    pub fn new(area: Area, max_speed_mps: f64, pause: SimTime, mut rng: StdRng) -> Self {
        let start = area.random_point(&mut rng);
        let mut rw = Self {
            area,
            max_speed_mps,
            pause,
            rng,
            from: start,
            to: start,
            depart: SimTime::ZERO,
            arrive: SimTime::ZERO,
            resume: SimTime::ZERO,
        };
        rw.next_leg(SimTime::ZERO);
        rw
    }

    fn next_leg(&mut self, depart: SimTime) {
        self.from = self.to;
        self.depart = depart;
        if self.max_speed_mps <= 0.0 {
            self.arrive = SimTime::MAX;
            self.resume = SimTime::MAX;
            return;
        }
        self.to = self.area.random_point(&mut self.rng);
        let speed = uniform(&mut self.rng, 0.0, self.max_speed_mps).max(MIN_SPEED_MPS);
        let travel = SimTime::from_secs_f64(self.from.distance(&self.to) / speed);
        self.arrive = depart.saturating_add(travel);
        self.resume = self.arrive.saturating_add(self.pause);
    }

    pub fn position_at(&mut self, t: SimTime) -> Position {
        // 停留结束后立即开始下一段；零长度行程直接停在原地
        while t >= self.resume && self.resume != SimTime::MAX {
            let depart = self.resume;
            self.next_leg(depart);
            if self.resume == depart {
                break;
            }
        }
        if t >= self.arrive {
            return self.to;
        }
        if t <= self.depart {
            return self.from;
        }
        let span = (self.arrive.0 - self.depart.0) as f64;
        let frac = (t.0 - self.depart.0) as f64 / span;
        self.from.lerp(&self.to, frac)
    }
}

fn uniform(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}
