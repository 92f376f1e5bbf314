// ==========================================
// 集装箱配载仿真系统 - 阻挡箱处理
// ==========================================
// 阻挡箱: 仅为取出下方本港箱而被卸下的集装箱
// 处理方式:
// - Reload:      卸下, 本港末尾与新箱一起按优先级重新装船
// - MoveInPlace: 直接移到其他列 (Move 指令), 不进入重装队列
// - DetachRuns:  同目的港的连续阻挡段整段移到另一列 (Move 指令);
//                无处容纳时卸下, 目的港一致则在原列复位
// ==========================================

use super::core::PortWorkspace;
use crate::domain::container::Container;
use crate::domain::ship_plan::SpotIndex;
use crate::engine::strategy::BlockerPolicy;
use tracing::debug;

// ==========================================
// BlockerHandler Trait
// ==========================================
// 实现者: ReloadBlockers, RelocateBlockers, DetachRuns
pub trait BlockerHandler: Send + Sync {
    /// 处理列顶阻挡箱
    ///
    /// # 返回
    /// - false: 配重拒绝, 该列无法继续向下处理
    fn take_blocker(&self, ws: &mut PortWorkspace<'_>, at: SpotIndex) -> bool {
        match ws.unload(at) {
            Some(container) => {
                ws.hold_blocker(at.column(), container);
                true
            }
            None => false,
        }
    }

    /// 全部卸箱结束后处理某列卸下的阻挡箱
    ///
    /// # 参数
    /// - blockers: 该列阻挡箱（按卸下顺序, 即自顶向下）
    fn settle_column(
        &self,
        ws: &mut PortWorkspace<'_>,
        _column: (usize, usize),
        blockers: Vec<Container>,
    ) {
        for container in blockers {
            ws.queue_reload(container);
        }
    }
}

pub fn handler_for(policy: BlockerPolicy) -> Box<dyn BlockerHandler> {
    match policy {
        BlockerPolicy::Reload => Box::new(ReloadBlockers),
        BlockerPolicy::MoveInPlace => Box::new(RelocateBlockers),
        BlockerPolicy::DetachRuns => Box::new(DetachRuns),
    }
}

// ==========================================
// 实现
// ==========================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ReloadBlockers;

impl BlockerHandler for ReloadBlockers {}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelocateBlockers;

impl BlockerHandler for RelocateBlockers {
    fn take_blocker(&self, ws: &mut PortWorkspace<'_>, at: SpotIndex) -> bool {
        if ws.relocate(at) {
            return true;
        }
        // 无处可移时退回卸下重装
        match ws.unload(at) {
            Some(container) => {
                ws.hold_blocker(at.column(), container);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DetachRuns;

impl BlockerHandler for DetachRuns {
    fn take_blocker(&self, ws: &mut PortWorkspace<'_>, at: SpotIndex) -> bool {
        if let Some(count) = single_destination_run(ws, at) {
            let moved = ws.relocate_run(at, count);
            if moved > 0 {
                debug!(spot = %at, count, moved, "同目的港阻挡段整段移列");
                return true;
            }
        }
        match ws.unload(at) {
            Some(container) => {
                ws.hold_blocker(at.column(), container);
                true
            }
            None => false,
        }
    }

    fn settle_column(
        &self,
        ws: &mut PortWorkspace<'_>,
        column: (usize, usize),
        blockers: Vec<Container>,
    ) {
        let single_destination = blockers
            .first()
            .map(|first| blockers.iter().all(|c| c.destination == first.destination))
            .unwrap_or(false);

        if !single_destination {
            for container in blockers {
                ws.queue_reload(container);
            }
            return;
        }

        debug!(
            x = column.0,
            y = column.1,
            count = blockers.len(),
            "同目的港阻挡段原列复位"
        );

        // 自底向上复位: 最后卸下的箱先装回
        let mut pending = blockers.into_iter().rev();
        while let Some(container) = pending.next() {
            if let Err(container) = ws.restack(column, container) {
                ws.queue_reload(container);
                for rest in pending.by_ref() {
                    ws.queue_reload(rest);
                }
            }
        }
    }
}

// 自 at 向下到第一个本港箱为止的阻挡段; 段内目的港一致时返回箱数
fn single_destination_run(ws: &PortWorkspace<'_>, at: SpotIndex) -> Option<usize> {
    let ship = ws.ship();
    let destination = ship.container_at(at)?.destination.as_str();
    let mut count = 0;
    for floor in (0..=at.floor).rev() {
        let container = match ship.container_at(SpotIndex::new(floor, at.x, at.y)) {
            Some(c) => c,
            None => break,
        };
        if container.destination == ws.port_code() {
            break;
        }
        if container.destination != destination {
            return None;
        }
        count += 1;
    }
    Some(count)
}
