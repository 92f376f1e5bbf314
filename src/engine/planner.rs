// ==========================================
// 集装箱配载仿真系统 - 配载规划引擎
// ==========================================
// 职责: 每港生成 卸箱 → 阻挡箱处理 → 拒装/装箱 指令流
// 输入: 船舶实况 + 剩余航线 + 本港舱单
// 输出: 指令流 + 规划器自报诊断码
// ==========================================
// 注: 选位规则与阻挡箱处理均可注入, 变体即配置
// ==========================================

mod blockers;
mod core;
mod spot_selection;

#[cfg(test)]
mod tests;

pub use blockers::{handler_for, BlockerHandler, DetachRuns, RelocateBlockers, ReloadBlockers};
pub use core::{PlanPhase, PlannerSettings, PortPlan, PortPlanner, PortWorkspace, StowagePlanner};
pub use spot_selection::{RuleChainSelector, SelectionContext, SpotSelector};
