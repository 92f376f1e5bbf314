// ==========================================
// 集装箱配载仿真系统 - 港口结束检查
// ==========================================
// 1. 船满拒装复核: 港口结束时船仍满, 且未装入目的港更远的箱
// 2. 卸下未装回的非本港箱
// 3. 未收到 L/R 的待装箱
// 4. 未拒装的重复箱号副本
// 5. 离港时船上仍有本港箱 (漏卸)
// ==========================================

use super::core::{PortState, ValidationEngine};
use super::report::IssueKind;
use crate::domain::container::Container;
use crate::domain::types::DestinationOrder;
use tracing::debug;

impl ValidationEngine {
    /// 结束当前港口并执行离港检查
    pub fn end_port(&mut self) {
        let state = match self.state.take() {
            Some(state) => state,
            None => return,
        };
        let port = state.call.code.clone();
        let visit = state.call.visit;
        let issues_before = self.issues.len();

        for id in self.unfair_rejections(&state) {
            self.push_issue(
                &port,
                visit,
                IssueKind::UnfairRejection,
                Some(id.as_str()),
                "船满时拒装合格箱, 但本港装入了目的港更远的箱".to_string(),
            );
        }
        if !self.ship.is_full() {
            for id in &state.potential_rejects {
                self.push_issue(
                    &port,
                    visit,
                    IssueKind::UnfairRejection,
                    Some(id.as_str()),
                    format!("拒装时船满, 但离港时船上有 {} 个空位", self.ship.free_spots()),
                );
            }
        }

        for (id, container) in &state.unloaded {
            self.push_issue(
                &port,
                visit,
                IssueKind::LeftAtWrongPort,
                Some(id.as_str()),
                format!("目的港为 {} 的箱卸下后未装回", container.destination),
            );
        }

        for container in state.port.waiting_containers() {
            if !state.handled.contains(&container.id) {
                self.push_issue(
                    &port,
                    visit,
                    IssueKind::UntreatedContainer,
                    Some(container.id.as_str()),
                    "待装箱既未装船也未拒装".to_string(),
                );
            }
        }

        for (id, count) in state.port.outstanding_duplicates() {
            self.push_issue(
                &port,
                visit,
                IssueKind::UnrejectedDuplicate,
                Some(id),
                format!("尚有 {} 份重复副本未拒装", count),
            );
        }

        let missed: Vec<String> = self
            .ship
            .containers_for_destination(&port)
            .iter()
            .map(|c| c.id.clone())
            .collect();
        for id in missed {
            self.push_issue(
                &port,
                visit,
                IssueKind::MissedUnload,
                Some(id.as_str()),
                "离港时本港箱仍在船上".to_string(),
            );
        }

        debug!(
            travel = %self.travel,
            port = %port,
            visit,
            new_issues = self.issues.len() - issues_before,
            "港口结束检查完成"
        );
    }

    // 船满拒装的公平性复核
    //
    // 待装列表按近港优先稳定排序; 被拒箱同距离组的最后位置
    // 早于本港已装箱的最后位置, 即有更远的箱占用了它的空位
    fn unfair_rejections(&self, state: &PortState) -> Vec<String> {
        if state.potential_rejects.is_empty() || !self.ship.is_full() {
            return Vec::new();
        }

        let mut ordered: Vec<&Container> = state.port.waiting_containers().iter().collect();
        self.route.sort_by_destination(&mut ordered, DestinationOrder::NearestFirst, |c| {
            c.destination.as_str()
        });

        let last_loaded = match ordered
            .iter()
            .rposition(|c| state.loaded.iter().any(|id| *id == c.id))
        {
            Some(index) => index,
            None => return Vec::new(),
        };

        state
            .potential_rejects
            .iter()
            .filter(|id| {
                let rank = match state.port.waiting_container(id) {
                    Some(c) => self.route.destination_rank(&c.destination),
                    None => return false,
                };
                ordered
                    .iter()
                    .rposition(|c| self.route.destination_rank(&c.destination) == rank)
                    .map(|last_same_rank| last_same_rank < last_loaded)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}
