// ==========================================
// 集装箱配载仿真系统 - 规划器选位
// ==========================================
// 职责: 在给定排除集合下为集装箱挑选一个合法箱位
// 红线: 只返回合法箱位 (可用、为空、不悬空), 不返回排除集合中的箱位
// 红线: 扫描顺序确定且覆盖全部箱位
// ==========================================

use crate::domain::container::Container;
use crate::domain::route::Route;
use crate::domain::ship_plan::{ShipPlan, SpotIndex};
use crate::engine::strategy::SpotRule;
use std::collections::HashSet;

// ==========================================
// SelectionContext - 选位上下文
// ==========================================
pub struct SelectionContext<'a> {
    pub ship: &'a ShipPlan,
    pub route: &'a Route,

    /// 本次调用中配重被拒的箱位
    pub excluded: &'a HashSet<SpotIndex>,

    /// 不允许落箱的列
    pub blocked_columns: &'a HashSet<(usize, usize)>,

    /// 远港判定比例
    pub far_ratio: f64,
}

impl<'a> SelectionContext<'a> {
    pub fn is_candidate(&self, index: SpotIndex) -> bool {
        !self.excluded.contains(&index)
            && !self.blocked_columns.contains(&index.column())
            && self.ship.is_legal_load_spot(index)
    }

    /// 列内可用的候选箱位（每列至多一个: 最低空位）
    pub fn column_candidate(&self, x: usize, y: usize) -> Option<SpotIndex> {
        self.ship
            .get_first_free_spot_in(x, y)
            .filter(|index| self.is_candidate(*index))
    }

    /// 目的港是否为远港: 距离 >= 比例 × 剩余港口数
    pub fn is_far(&self, destination: &str) -> bool {
        match self.route.stops_until_port(destination) {
            Some(stops) => stops as f64 >= self.far_ratio * self.route.stops_left() as f64,
            None => false,
        }
    }

    fn columns(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cols = self.ship.cols();
        (0..self.ship.rows()).flat_map(move |x| (0..cols).map(move |y| (x, y)))
    }
}

// ==========================================
// SpotSelector Trait
// ==========================================
// 实现者: RuleChainSelector
pub trait SpotSelector: Send + Sync {
    /// 为集装箱挑选箱位
    ///
    /// # 返回
    /// - Some(index): 合法候选箱位
    /// - None: 无可用箱位
    fn select(&self, ctx: &SelectionContext<'_>, container: &Container) -> Option<SpotIndex>;
}

// ==========================================
// RuleChainSelector - 规则链选位
// ==========================================
// 按顺序尝试每条规则, 第一条命中的规则决定箱位
#[derive(Debug, Clone)]
pub struct RuleChainSelector {
    rules: Vec<SpotRule>,
}

impl RuleChainSelector {
    /// 空规则链退化为顺序扫描
    pub fn new(rules: Vec<SpotRule>) -> Self {
        let rules = if rules.is_empty() {
            vec![SpotRule::ScanForward]
        } else {
            rules
        };
        Self { rules }
    }

    pub fn rules(&self) -> &[SpotRule] {
        &self.rules
    }
}

impl SpotSelector for RuleChainSelector {
    fn select(&self, ctx: &SelectionContext<'_>, container: &Container) -> Option<SpotIndex> {
        self.rules
            .iter()
            .find_map(|rule| apply_rule(*rule, ctx, container))
    }
}

fn apply_rule(rule: SpotRule, ctx: &SelectionContext<'_>, container: &Container) -> Option<SpotIndex> {
    match rule {
        SpotRule::SameDestination => ctx.columns().find_map(|(x, y)| {
            let top = ctx.ship.top_container(x, y)?;
            if top.destination != container.destination {
                return None;
            }
            ctx.column_candidate(x, y)
        }),
        SpotRule::FarToGround => {
            if !ctx.is_far(&container.destination) {
                return None;
            }
            ctx.columns()
                .filter(|(x, y)| ctx.ship.is_column_empty(*x, *y))
                .find_map(|(x, y)| ctx.column_candidate(x, y))
        }
        SpotRule::ScanForward => scan(ctx, false),
        SpotRule::ScanReverse => scan(ctx, true),
    }
}

// 逐层扫描, 层内按行列顺序（或逆序）
fn scan(ctx: &SelectionContext<'_>, reverse: bool) -> Option<SpotIndex> {
    let mut columns: Vec<(usize, usize)> = ctx.columns().collect();
    if reverse {
        columns.reverse();
    }
    (0..ctx.ship.decks()).find_map(|floor| {
        columns
            .iter()
            .map(|(x, y)| SpotIndex::new(floor, *x, *y))
            .find(|index| ctx.is_candidate(*index))
    })
}
