// ==========================================
// 集装箱配载仿真系统 - 校验问题记录
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 校验问题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    // ===== 指令级 =====
    InvalidInstruction,
    IllegalLoad,
    IllegalUnload,
    IllegalMove,
    IllegalReject,

    // ===== 港口结束时 =====
    UnfairRejection,
    UntreatedContainer,
    UnrejectedDuplicate,
    LeftAtWrongPort,
    MissedUnload,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::InvalidInstruction => "invalid_instruction",
            IssueKind::IllegalLoad => "illegal_load",
            IssueKind::IllegalUnload => "illegal_unload",
            IssueKind::IllegalMove => "illegal_move",
            IssueKind::IllegalReject => "illegal_reject",
            IssueKind::UnfairRejection => "unfair_rejection",
            IssueKind::UntreatedContainer => "untreated_container",
            IssueKind::UnrejectedDuplicate => "unrejected_duplicate",
            IssueKind::LeftAtWrongPort => "left_at_wrong_port",
            IssueKind::MissedUnload => "missed_unload",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            IssueKind::InvalidInstruction => "指令格式错误",
            IssueKind::IllegalLoad => "非法装箱",
            IssueKind::IllegalUnload => "非法卸箱",
            IssueKind::IllegalMove => "非法移箱",
            IssueKind::IllegalReject => "非法拒装",
            IssueKind::UnfairRejection => "不公平拒装",
            IssueKind::UntreatedContainer => "待装箱未处理",
            IssueKind::UnrejectedDuplicate => "重复箱号未拒装",
            IssueKind::LeftAtWrongPort => "箱被留在错误港口",
            IssueKind::MissedUnload => "漏卸本港箱",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title_cn())
    }
}

// ==========================================
// ValidationIssue - 一条校验问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub travel: String,
    pub port: String,
    pub visit: usize,
    pub container_id: Option<String>,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 第{}次挂靠", self.port, self.visit)?;
        if let Some(id) = &self.container_id {
            write!(f, " 箱号 {}", id)?;
        }
        write!(f, ": {}: {}", self.kind, self.message)
    }
}
