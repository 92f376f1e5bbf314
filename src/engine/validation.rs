// ==========================================
// 集装箱配载仿真系统 - 指令校验引擎
// ==========================================
// 职责: 回放规划器指令流, 认证每条指令与每个港口的合法性
// 输入: 独立构建的船舶/航线 + 独立的配重策略实例
// 输出: 操作数 + 校验问题列表
// ==========================================

mod core;
mod port_checks;
mod report;


pub use core::ValidationEngine;
pub use report::{IssueKind, ValidationIssue};
