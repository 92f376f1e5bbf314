// ==========================================
// 集装箱配载仿真系统 - 领域类型定义
// ==========================================
// 职责: 跨模块共享的枚举与常量
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 航线排序方向 (Destination Order)
// ==========================================
// 红线: 近港优先 / 远港优先 是策略参数,不允许硬编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationOrder {
    NearestFirst,  // 近港优先
    FarthestFirst, // 远港优先
}

impl DestinationOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationOrder::NearestFirst => "nearest_first",
            DestinationOrder::FarthestFirst => "farthest_first",
        }
    }
}

impl Default for DestinationOrder {
    fn default() -> Self {
        DestinationOrder::NearestFirst
    }
}

impl fmt::Display for DestinationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DestinationOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest_first" | "nearest-first" => Ok(DestinationOrder::NearestFirst),
            "farthest_first" | "farthest-first" => Ok(DestinationOrder::FarthestFirst),
            other => Err(format!("未知排序方向: {}", other)),
        }
    }
}

// ==========================================
// 指令类型 (Instruction Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    Load,   // L
    Unload, // U
    Move,   // M
    Reject, // R
}

impl InstructionKind {
    /// 指令文件中的单字母标记
    pub fn code(&self) -> &'static str {
        match self {
            InstructionKind::Load => "L",
            InstructionKind::Unload => "U",
            InstructionKind::Move => "M",
            InstructionKind::Reject => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(InstructionKind::Load),
            "U" => Some(InstructionKind::Unload),
            "M" => Some(InstructionKind::Move),
            "R" => Some(InstructionKind::Reject),
            _ => None,
        }
    }

    /// 该指令期望的字段数（含指令标记）
    pub fn field_count(&self) -> usize {
        match self {
            InstructionKind::Move => 8,
            _ => 5,
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 文件后缀约定
// ==========================================
pub const SHIP_PLAN_EXTENSION: &str = "ship_plan";
pub const ROUTE_EXTENSION: &str = "route";
pub const CARGO_EXTENSION: &str = "cargo_data";
pub const INSTRUCTION_EXTENSION: &str = "crane_instructions";

/// 港口代码长度
pub const PORT_CODE_LEN: usize = 5;
