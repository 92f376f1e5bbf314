// ==========================================
// 集装箱配载仿真系统 - 港口挂靠
// ==========================================
// 职责: 单次挂靠的待装箱列表与重复箱号计数
// 红线: 重复箱号的每一份副本都必须被显式拒装
// ==========================================

use crate::domain::container::{Container, InvalidReason};
use crate::domain::ship_plan::ShipPlan;
use std::collections::{BTreeMap, HashMap};

// ==========================================
// Port - 港口挂靠
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Port {
    /// 港口代码
    pub code: String,

    /// 第几次挂靠（从 1 开始）
    pub visit: usize,

    /// 待装箱（每个箱号仅保留首次出现）
    waiting: Vec<Container>,

    /// 箱号 → 尚未拒装的重复副本数
    duplicates: BTreeMap<String, usize>,

    /// 箱号 → waiting 下标
    lookup: HashMap<String, usize>,
}

impl Port {
    pub fn new(code: &str, visit: usize) -> Self {
        Self {
            code: code.to_string(),
            visit,
            ..Default::default()
        }
    }

    /// 登记一个舱单集装箱
    ///
    /// # 返回
    /// - true: 首次出现, 已加入待装列表
    /// - false: 重复箱号, 仅累加重复计数
    pub fn add_waiting(&mut self, container: Container) -> bool {
        if self.lookup.contains_key(&container.id) {
            *self.duplicates.entry(container.id).or_insert(0) += 1;
            return false;
        }
        self.lookup.insert(container.id.clone(), self.waiting.len());
        self.waiting.push(container);
        true
    }

    pub fn waiting_containers(&self) -> &[Container] {
        &self.waiting
    }

    pub fn waiting_container(&self, id: &str) -> Option<&Container> {
        self.lookup.get(id).map(|i| &self.waiting[*i])
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    // ==========================================
    // 重复箱号
    // ==========================================

    pub fn duplicate_count(&self, id: &str) -> usize {
        self.duplicates.get(id).copied().unwrap_or(0)
    }

    /// 消耗一份重复副本
    ///
    /// # 返回
    /// - true: 存在未拒装的副本, 已扣减
    pub fn take_duplicate(&mut self, id: &str) -> bool {
        match self.duplicates.get_mut(id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    /// 仍有未拒装副本的箱号
    pub fn outstanding_duplicates(&self) -> Vec<(&str, usize)> {
        self.duplicates
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, count)| (id.as_str(), *count))
            .collect()
    }

    pub fn total_duplicates(&self) -> usize {
        self.duplicates.values().sum()
    }

    /// 箱号已在船上的待装箱标记为无效
    ///
    /// # 返回
    /// 被标记的数量
    pub fn invalidate_aboard(&mut self, ship: &ShipPlan) -> usize {
        let mut count = 0;
        for container in self.waiting.iter_mut() {
            if ship.is_container_aboard(&container.id) {
                container.invalidate(InvalidReason::AlreadyAboard);
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ship_plan::SpotIndex;

    #[test]
    fn test_duplicates_counted_per_copy() {
        let mut port = Port::new("ILHFA", 1);
        assert!(port.add_waiting(Container::new("AAAU1234567", 100, "FRPAR")));
        assert!(!port.add_waiting(Container::new("AAAU1234567", 200, "FRPAR")));
        assert!(!port.add_waiting(Container::new("AAAU1234567", 300, "FRPAR")));
        assert_eq!(port.waiting_containers().len(), 1);
        assert_eq!(port.duplicate_count("AAAU1234567"), 2);
        // 保留首次出现的数据
        assert_eq!(port.waiting_container("AAAU1234567").and_then(|c| c.weight), Some(100));

        assert!(port.take_duplicate("AAAU1234567"));
        assert!(port.take_duplicate("AAAU1234567"));
        assert!(!port.take_duplicate("AAAU1234567"));
        assert!(port.outstanding_duplicates().is_empty());
    }

    #[test]
    fn test_invalidate_aboard() {
        let mut ship = ShipPlan::new(1, 1, 1);
        ship.insert_container(SpotIndex::new(0, 0, 0), Container::new("AAAU1234567", 100, "FRPAR"))
            .unwrap();

        let mut port = Port::new("ILHFA", 1);
        port.add_waiting(Container::new("AAAU1234567", 100, "FRPAR"));
        port.add_waiting(Container::new("BBBU1234567", 100, "FRPAR"));
        assert_eq!(port.invalidate_aboard(&ship), 1);
        assert_eq!(
            port.waiting_container("AAAU1234567").and_then(|c| c.invalid_reason()),
            Some(InvalidReason::AlreadyAboard)
        );
        assert!(port.waiting_container("BBBU1234567").map(|c| c.is_valid()).unwrap_or(false));
    }
}
