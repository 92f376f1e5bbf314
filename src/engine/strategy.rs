// ==========================================
// 集装箱配载仿真系统 - 策略定义
// ==========================================
// 用途：
// - 规划器变体 = 选位规则链 + 阻挡箱处理方式 + 目的港排序方向；
// - 内置变体与配置中的自定义策略共用同一套定义，保证结果可复现。

use crate::domain::types::DestinationOrder;
use serde::{Deserialize, Serialize};

// ==========================================
// 选位规则 (Spot Rule)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotRule {
    SameDestination, // 叠放在同目的港箱列之上
    FarToGround,     // 远港箱优先落在空列底层
    ScanForward,     // 按层 → 行 → 列顺序扫描
    ScanReverse,     // 按层顺序, 行列逆序扫描
}

impl SpotRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotRule::SameDestination => "same_destination",
            SpotRule::FarToGround => "far_to_ground",
            SpotRule::ScanForward => "scan_forward",
            SpotRule::ScanReverse => "scan_reverse",
        }
    }
}

impl std::str::FromStr for SpotRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "same_destination" | "same-destination" => Ok(SpotRule::SameDestination),
            "far_to_ground" | "far-to-ground" => Ok(SpotRule::FarToGround),
            "scan_forward" | "scan-forward" | "scan" => Ok(SpotRule::ScanForward),
            "scan_reverse" | "scan-reverse" => Ok(SpotRule::ScanReverse),
            other => Err(format!("未知选位规则: {}", other)),
        }
    }
}

// ==========================================
// 阻挡箱处理方式 (Blocker Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerPolicy {
    Reload,     // 卸下后在本港末尾重新装船
    MoveInPlace, // 船内移到其他列, 不进入重装队列
    DetachRuns, // 同目的港阻挡段整段卸下后原列复位
}

impl BlockerPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockerPolicy::Reload => "reload",
            BlockerPolicy::MoveInPlace => "move_in_place",
            BlockerPolicy::DetachRuns => "detach_runs",
        }
    }
}

impl Default for BlockerPolicy {
    fn default() -> Self {
        BlockerPolicy::Reload
    }
}

impl std::str::FromStr for BlockerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reload" => Ok(BlockerPolicy::Reload),
            "move_in_place" | "move-in-place" | "move" => Ok(BlockerPolicy::MoveInPlace),
            "detach_runs" | "detach-runs" => Ok(BlockerPolicy::DetachRuns),
            other => Err(format!("未知阻挡箱处理方式: {}", other)),
        }
    }
}

// ==========================================
// 内置策略 (Strategy Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    NaiveScan,
    SameDestStack,
    GroundFirstMove,
    RunDetach,
    ReverseScan,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::NaiveScan,
        StrategyKind::SameDestStack,
        StrategyKind::GroundFirstMove,
        StrategyKind::RunDetach,
        StrategyKind::ReverseScan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::NaiveScan => "naive_scan",
            StrategyKind::SameDestStack => "same_dest_stack",
            StrategyKind::GroundFirstMove => "ground_first_move",
            StrategyKind::RunDetach => "run_detach",
            StrategyKind::ReverseScan => "reverse_scan",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            StrategyKind::NaiveScan => "顺序扫描",
            StrategyKind::SameDestStack => "同港叠放",
            StrategyKind::GroundFirstMove => "远港落底+移箱",
            StrategyKind::RunDetach => "同港段整卸",
            StrategyKind::ReverseScan => "逆序扫描+远港优先",
        }
    }

    pub fn definition(&self) -> StrategyDefinition {
        use SpotRule::*;
        let (rules, blockers, order) = match self {
            StrategyKind::NaiveScan => (
                vec![ScanForward],
                BlockerPolicy::Reload,
                DestinationOrder::NearestFirst,
            ),
            StrategyKind::SameDestStack => (
                vec![SameDestination, FarToGround, ScanForward],
                BlockerPolicy::Reload,
                DestinationOrder::NearestFirst,
            ),
            StrategyKind::GroundFirstMove => (
                vec![FarToGround, SameDestination, ScanForward],
                BlockerPolicy::MoveInPlace,
                DestinationOrder::NearestFirst,
            ),
            StrategyKind::RunDetach => (
                vec![SameDestination, FarToGround, ScanForward],
                BlockerPolicy::DetachRuns,
                DestinationOrder::NearestFirst,
            ),
            StrategyKind::ReverseScan => (
                vec![ScanReverse],
                BlockerPolicy::Reload,
                DestinationOrder::NearestFirst,
            ),
        };

        StrategyDefinition {
            name: self.as_str().to_string(),
            spot_rules: rules,
            blockers,
            order,
        }
    }
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::NaiveScan
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "naive_scan" | "naive-scan" => Ok(StrategyKind::NaiveScan),
            "same_dest_stack" | "same-dest-stack" => Ok(StrategyKind::SameDestStack),
            "ground_first_move" | "ground-first-move" => Ok(StrategyKind::GroundFirstMove),
            "run_detach" | "run-detach" => Ok(StrategyKind::RunDetach),
            "reverse_scan" | "reverse-scan" => Ok(StrategyKind::ReverseScan),
            other => Err(format!("未知策略类型: {}", other)),
        }
    }
}

// ==========================================
// StrategyDefinition - 一个已解析的规划器变体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    pub name: String,
    pub spot_rules: Vec<SpotRule>,
    pub blockers: BlockerPolicy,
    pub order: DestinationOrder,
}
