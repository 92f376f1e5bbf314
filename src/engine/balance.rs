// ==========================================
// 集装箱配载仿真系统 - 配重平衡策略接口
// ==========================================
// 职责: 每次实际装/卸箱前给出 批准/拒绝 结论
// 红线: 引擎不做任何配重计算, 只服从结论
// 红线: 结论只取决于 (操作, 重量, x, y), 规划器与校验器的实例各自独立
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 需配重确认的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceOperation {
    Load,
    Unload,
}

impl fmt::Display for BalanceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceOperation::Load => write!(f, "load"),
            BalanceOperation::Unload => write!(f, "unload"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceVerdict {
    Approved,
    Rejected,
}

impl BalanceVerdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, BalanceVerdict::Approved)
    }
}

// ==========================================
// WeightBalancePolicy Trait
// ==========================================
// 实现者: ApproveAllPolicy, FnBalancePolicy
pub trait WeightBalancePolicy: Send + Sync {
    /// 询问某次操作是否满足配重要求
    ///
    /// # 参数
    /// - op: 装箱 / 卸箱
    /// - weight: 集装箱重量
    /// - x, y: 箱位所在列
    fn try_operation(&self, op: BalanceOperation, weight: u32, x: usize, y: usize) -> BalanceVerdict;
}

/// 配重策略工厂（每个任务各自创建实例）
pub type BalancePolicyFactory = Arc<dyn Fn() -> Box<dyn WeightBalancePolicy> + Send + Sync>;

/// 默认工厂: 全部批准
pub fn approve_all_factory() -> BalancePolicyFactory {
    Arc::new(|| Box::new(ApproveAllPolicy) as Box<dyn WeightBalancePolicy>)
}

// ==========================================
// 实现
// ==========================================

/// 全部批准
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveAllPolicy;

impl WeightBalancePolicy for ApproveAllPolicy {
    fn try_operation(&self, _op: BalanceOperation, _weight: u32, _x: usize, _y: usize) -> BalanceVerdict {
        BalanceVerdict::Approved
    }
}

/// 闭包实现的配重策略
pub struct FnBalancePolicy<F>(pub F)
where
    F: Fn(BalanceOperation, u32, usize, usize) -> BalanceVerdict + Send + Sync;

impl<F> WeightBalancePolicy for FnBalancePolicy<F>
where
    F: Fn(BalanceOperation, u32, usize, usize) -> BalanceVerdict + Send + Sync,
{
    fn try_operation(&self, op: BalanceOperation, weight: u32, x: usize, y: usize) -> BalanceVerdict {
        (self.0)(op, weight, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_all() {
        let policy = approve_all_factory()();
        assert!(policy
            .try_operation(BalanceOperation::Unload, u32::MAX, 7, 3)
            .is_approved());
    }

    #[test]
    fn test_fn_policy() {
        let policy = FnBalancePolicy(|op, _w, x, _y| {
            if op == BalanceOperation::Load && x == 0 {
                BalanceVerdict::Rejected
            } else {
                BalanceVerdict::Approved
            }
        });
        assert_eq!(
            policy.try_operation(BalanceOperation::Load, 10, 0, 0),
            BalanceVerdict::Rejected
        );
        assert!(policy.try_operation(BalanceOperation::Unload, 10, 0, 0).is_approved());
        assert!(policy.try_operation(BalanceOperation::Load, 10, 1, 0).is_approved());
    }
}
