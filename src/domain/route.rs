// ==========================================
// 集装箱配载仿真系统 - 航线
// ==========================================
// 职责: 港口序列、当前港游标、挂靠次数、舱单文件分配
// 红线: 航线查询只看当前港之后的港口, 已挂靠港口不计入
// ==========================================

use crate::domain::types::DestinationOrder;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

// ==========================================
// CargoFile - 舱单文件（文件名已解析）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoFile {
    pub port: String,
    pub visit: usize,
    pub path: PathBuf,
}

/// 舱单文件分配被拒原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestRejection {
    /// 港口不在航线上
    PortNotInRoute(CargoFile),

    /// 挂靠序号超出该港实际挂靠次数
    VisitBeyondRoute { file: CargoFile, visits: usize },
}

impl fmt::Display for ManifestRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestRejection::PortNotInRoute(file) => write!(
                f,
                "舱单文件 {} 的港口 {} 不在航线上 (忽略)",
                file.path.display(),
                file.port
            ),
            ManifestRejection::VisitBeyondRoute { file, visits } => write!(
                f,
                "舱单文件 {} 为第 {} 次挂靠, 但航线只挂靠 {} {} 次 (忽略)",
                file.path.display(),
                file.visit,
                file.port,
                visits
            ),
        }
    }
}

// ==========================================
// PortCall - 一次挂靠
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCall {
    /// 港口代码
    pub code: String,

    /// 该港第几次挂靠（从 1 开始）
    pub visit: usize,

    /// 在航线中的位置
    pub index: usize,

    /// 是否末港
    pub is_last: bool,

    /// 本次挂靠的舱单文件
    pub manifest: Option<PathBuf>,
}

// ==========================================
// Route - 航线
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Route {
    ports: Vec<String>,

    /// 当前港下标（None 表示尚未到达首港）
    cursor: Option<usize>,

    /// 港口 → 已挂靠次数
    visit_counts: HashMap<String, usize>,

    /// (港口, 挂靠序号) → 舱单文件
    manifests: BTreeMap<(String, usize), PathBuf>,
}

impl Route {
    pub fn new(ports: Vec<String>) -> Self {
        Self {
            ports,
            ..Default::default()
        }
    }

    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    // ==========================================
    // 舱单文件分配
    // ==========================================

    /// 港口在整条航线中的挂靠总次数
    pub fn total_visits(&self, code: &str) -> usize {
        self.ports.iter().filter(|p| p.as_str() == code).count()
    }

    /// 分配舱单文件
    ///
    /// 按 (港口, 挂靠序号) 排序后逐个校验; 港口不在航线上或序号超出挂靠次数的文件被丢弃
    ///
    /// # 返回
    /// 被丢弃的文件列表
    pub fn assign_manifests(&mut self, mut files: Vec<CargoFile>) -> Vec<ManifestRejection> {
        files.sort_by(|a, b| (&a.port, a.visit).cmp(&(&b.port, b.visit)));

        let mut rejected = Vec::new();
        for file in files {
            let visits = self.total_visits(&file.port);
            if visits == 0 {
                rejected.push(ManifestRejection::PortNotInRoute(file));
                continue;
            }
            if file.visit == 0 || file.visit > visits {
                rejected.push(ManifestRejection::VisitBeyondRoute { file, visits });
                continue;
            }
            self.manifests
                .insert((file.port.clone(), file.visit), file.path);
        }
        rejected
    }

    pub fn manifest_for(&self, code: &str, visit: usize) -> Option<&Path> {
        self.manifests
            .get(&(code.to_string(), visit))
            .map(|p| p.as_path())
    }

    // ==========================================
    // 游标推进
    // ==========================================

    pub fn has_next_port(&self) -> bool {
        match self.cursor {
            None => !self.ports.is_empty(),
            Some(c) => c + 1 < self.ports.len(),
        }
    }

    /// 推进到下一港
    ///
    /// 游标和该港挂靠计数同时递增; 舱单的读取由调用方完成
    pub fn advance_to_next_port(&mut self) -> Option<PortCall> {
        if !self.has_next_port() {
            return None;
        }
        let next = self.cursor.map(|c| c + 1).unwrap_or(0);
        self.cursor = Some(next);

        let code = self.ports[next].clone();
        let visit = {
            let count = self.visit_counts.entry(code.clone()).or_insert(0);
            *count += 1;
            *count
        };

        Some(PortCall {
            manifest: self.manifest_for(&code, visit).map(|p| p.to_path_buf()),
            is_last: next + 1 == self.ports.len(),
            index: next,
            visit,
            code,
        })
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current_port(&self) -> Option<&str> {
        self.cursor
            .and_then(|c| self.ports.get(c))
            .map(|s| s.as_str())
    }

    pub fn current_visit(&self) -> usize {
        self.current_port()
            .and_then(|p| self.visit_counts.get(p).copied())
            .unwrap_or(0)
    }

    pub fn is_last_port(&self) -> bool {
        self.cursor.map(|c| c + 1 == self.ports.len()).unwrap_or(false)
    }

    // ==========================================
    // 航线相对查询
    // ==========================================

    // 当前港之后的港口
    fn remaining(&self) -> &[String] {
        let start = self.cursor.map(|c| c + 1).unwrap_or(0);
        self.ports.get(start..).unwrap_or(&[])
    }

    /// 目的港是否在剩余航线中
    pub fn is_in_remaining_route(&self, code: &str) -> bool {
        self.remaining().iter().any(|p| p == code)
    }

    /// 距目的港的航段数（下一港为 1）
    pub fn stops_until_port(&self, code: &str) -> Option<usize> {
        self.remaining()
            .iter()
            .position(|p| p == code)
            .map(|i| i + 1)
    }

    /// 剩余港口数
    pub fn stops_left(&self) -> usize {
        self.remaining().len()
    }

    /// 两个目的港中先到达的一个
    pub fn get_closer_destination<'a>(&self, d1: &'a str, d2: &'a str) -> Option<&'a str> {
        match (self.stops_until_port(d1), self.stops_until_port(d2)) {
            (Some(a), Some(b)) if a <= b => Some(d1),
            (Some(_), Some(_)) => Some(d2),
            (Some(_), None) => Some(d1),
            (None, Some(_)) => Some(d2),
            (None, None) => None,
        }
    }

    /// 排序用航线距离（不在剩余航线中的视为无穷远）
    pub fn destination_rank(&self, code: &str) -> usize {
        self.stops_until_port(code).unwrap_or(usize::MAX)
    }

    /// 按目的港距离稳定排序
    ///
    /// # 参数
    /// - items: 待排序元素
    /// - order: 近港优先 / 远港优先
    /// - destination: 取元素目的港
    pub fn sort_by_destination<T, F>(&self, items: &mut [T], order: DestinationOrder, destination: F)
    where
        F: Fn(&T) -> &str,
    {
        match order {
            DestinationOrder::NearestFirst => {
                items.sort_by_key(|item| self.destination_rank(destination(item)))
            }
            DestinationOrder::FarthestFirst => {
                items.sort_by_key(|item| Reverse(self.destination_rank(destination(item))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_route(ports: &[&str]) -> Route {
        Route::new(ports.iter().map(|p| p.to_string()).collect())
    }

    fn cargo(port: &str, visit: usize) -> CargoFile {
        CargoFile {
            port: port.to_string(),
            visit,
            path: PathBuf::from(format!("{}_{}.cargo_data", port, visit)),
        }
    }

    // ==========================================
    // 测试用例
    // ==========================================

    #[test]
    fn test_advance_counts_visits() {
        let mut route = create_test_route(&["AAAAA", "BBBBB", "AAAAA"]);
        assert!(route.has_next_port());
        assert_eq!(route.current_port(), None);

        let first = route.advance_to_next_port().unwrap();
        assert_eq!((first.code.as_str(), first.visit, first.is_last), ("AAAAA", 1, false));
        route.advance_to_next_port().unwrap();
        let third = route.advance_to_next_port().unwrap();
        assert_eq!((third.code.as_str(), third.visit, third.is_last), ("AAAAA", 2, true));
        assert!(!route.has_next_port());
        assert!(route.advance_to_next_port().is_none());
    }

    #[test]
    fn test_remaining_route_excludes_visited() {
        let mut route = create_test_route(&["AAAAA", "BBBBB", "CCCCC", "DDDDD"]);
        route.advance_to_next_port();
        route.advance_to_next_port(); // 当前港 BBBBB

        assert!(!route.is_in_remaining_route("AAAAA"));
        assert!(!route.is_in_remaining_route("BBBBB"), "当前港不属于剩余航线");
        assert!(route.is_in_remaining_route("DDDDD"));
        assert_eq!(route.stops_until_port("CCCCC"), Some(1));
        assert_eq!(route.stops_until_port("DDDDD"), Some(2));
        assert_eq!(route.stops_until_port("AAAAA"), None);
        assert_eq!(route.stops_left(), 2);
        assert_eq!(route.get_closer_destination("DDDDD", "CCCCC"), Some("CCCCC"));
        assert_eq!(route.get_closer_destination("AAAAA", "DDDDD"), Some("DDDDD"));
        assert_eq!(route.get_closer_destination("AAAAA", "ZZZZZ"), None);
    }

    #[test]
    fn test_sort_by_destination_both_orders() {
        let mut route = create_test_route(&["AAAAA", "BBBBB", "CCCCC", "DDDDD"]);
        route.advance_to_next_port();

        let mut dests = vec!["DDDDD", "BBBBB", "CCCCC", "BBBBB"];
        route.sort_by_destination(&mut dests, DestinationOrder::NearestFirst, |d| *d);
        assert_eq!(dests, vec!["BBBBB", "BBBBB", "CCCCC", "DDDDD"]);

        route.sort_by_destination(&mut dests, DestinationOrder::FarthestFirst, |d| *d);
        assert_eq!(dests, vec!["DDDDD", "CCCCC", "BBBBB", "BBBBB"]);
    }

    #[test]
    fn test_assign_manifests_validates_against_route() {
        let mut route = create_test_route(&["AAAAA", "BBBBB", "AAAAA"]);
        let rejected = route.assign_manifests(vec![
            cargo("AAAAA", 2),
            cargo("AAAAA", 1),
            cargo("AAAAA", 3),
            cargo("ZZZZZ", 1),
        ]);

        assert_eq!(rejected.len(), 2);
        assert!(matches!(
            &rejected[0],
            ManifestRejection::VisitBeyondRoute { visits: 2, .. }
        ));
        assert!(matches!(&rejected[1], ManifestRejection::PortNotInRoute(f) if f.port == "ZZZZZ"));

        assert!(route.manifest_for("AAAAA", 1).is_some());
        assert!(route.manifest_for("BBBBB", 1).is_none());

        let call = route.advance_to_next_port().unwrap();
        assert!(call.manifest.is_some());
        let call = route.advance_to_next_port().unwrap();
        assert!(call.manifest.is_none());
    }
}
