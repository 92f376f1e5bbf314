// ==========================================
// 集装箱配载仿真系统 - 配载规划器
// ==========================================
// 职责: 根据当前港、船舶实况与剩余航线生成本港指令流
// 状态机: Idle → UnloadDestined → RelocateBlockers → LoadNew → Done
// 红线: 规划器从不报致命错误, 容量不足与无效输入一律以 Reject 处理
// 红线: 每次实际装/卸/移箱前必须取得配重策略批准
// ==========================================

use super::blockers::{handler_for, BlockerHandler};
use super::spot_selection::{RuleChainSelector, SelectionContext, SpotSelector};
use crate::domain::container::Container;
use crate::domain::diagnostic::{DiagnosticCode, DiagnosticSet};
use crate::domain::instruction::Instruction;
use crate::domain::port::Port;
use crate::domain::route::Route;
use crate::domain::ship_plan::{ShipPlan, SpotIndex};
use crate::domain::types::DestinationOrder;
use crate::engine::balance::{ApproveAllPolicy, BalanceOperation, WeightBalancePolicy};
use crate::engine::strategy::StrategyDefinition;
use crate::importer::{ManifestReader, RouteReader, ShipPlanReader};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

// ==========================================
// PortPlan - 单港规划结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortPlan {
    /// 按决策顺序排列的指令
    pub instructions: Vec<Instruction>,

    /// 规划器自行发现的输入问题
    pub reported: DiagnosticSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanPhase {
    Idle,
    UnloadDestined,
    RelocateBlockers,
    LoadNew,
    Done,
}

impl PlanPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanPhase::Idle => "idle",
            PlanPhase::UnloadDestined => "unload_destined",
            PlanPhase::RelocateBlockers => "relocate_blockers",
            PlanPhase::LoadNew => "load_new",
            PlanPhase::Done => "done",
        }
    }
}

// ==========================================
// StowagePlanner Trait
// ==========================================
// 用途: 可插拔规划算法的统一接口
// 实现者: PortPlanner
// 约定: 规划器自己持有船舶与航线, 每次 plan_port 推进到下一港
pub trait StowagePlanner: Send {
    fn name(&self) -> &str;

    /// 读取船型文件
    fn read_ship_plan(&mut self, path: &Path) -> DiagnosticSet;

    /// 读取航线文件
    fn read_route(&mut self, path: &Path) -> DiagnosticSet;

    fn set_balance_policy(&mut self, policy: Box<dyn WeightBalancePolicy>);

    /// 推进到下一港并生成本港指令
    ///
    /// # 参数
    /// - manifest: 本次挂靠的舱单文件（None 表示无待装箱）
    fn plan_port(&mut self, manifest: Option<&Path>) -> PortPlan;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerSettings {
    /// 远港判定比例
    pub far_ratio: f64,

    /// 箱号是否校验 ISO 6346 校验码
    pub strict_check_digit: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            far_ratio: 0.8,
            strict_check_digit: false,
        }
    }
}

// ==========================================
// PortWorkspace - 单港规划工作区
// ==========================================
// 持有本港期间的船舶可变借用, 所有箱位变更与指令追加都经由这里
pub struct PortWorkspace<'a> {
    ship: &'a mut ShipPlan,
    route: &'a Route,
    policy: &'a dyn WeightBalancePolicy,
    selector: &'a dyn SpotSelector,
    far_ratio: f64,
    port_code: String,
    instructions: Vec<Instruction>,

    /// 待重装的阻挡箱
    reload: Vec<Container>,

    /// 列 → 该列卸下的阻挡箱（自顶向下）
    column_blockers: BTreeMap<(usize, usize), Vec<Container>>,
}

impl<'a> PortWorkspace<'a> {
    fn new(
        ship: &'a mut ShipPlan,
        route: &'a Route,
        policy: &'a dyn WeightBalancePolicy,
        selector: &'a dyn SpotSelector,
        far_ratio: f64,
        port_code: &str,
    ) -> Self {
        Self {
            ship,
            route,
            policy,
            selector,
            far_ratio,
            port_code: port_code.to_string(),
            instructions: Vec::new(),
            reload: Vec::new(),
            column_blockers: BTreeMap::new(),
        }
    }

    pub fn ship(&self) -> &ShipPlan {
        &*self.ship
    }

    pub fn port_code(&self) -> &str {
        &self.port_code
    }

    fn approves(&self, op: BalanceOperation, weight: u32, at: SpotIndex) -> bool {
        self.policy.try_operation(op, weight, at.x, at.y).is_approved()
    }

    /// 卸下箱位上的集装箱并追加 U 指令
    ///
    /// # 返回
    /// - None: 箱位为空、上方有箱或配重拒绝
    pub fn unload(&mut self, at: SpotIndex) -> Option<Container> {
        let weight = self.ship.container_at(at)?.weight_or_zero();
        if !self.approves(BalanceOperation::Unload, weight, at) {
            debug!(spot = %at, "卸箱被配重拒绝");
            return None;
        }
        match self.ship.remove_container(at) {
            Ok(container) => {
                self.instructions.push(Instruction::unload(&container.id, at));
                Some(container)
            }
            Err(e) => {
                debug!(spot = %at, error = %e, "卸箱失败");
                None
            }
        }
    }

    pub fn hold_blocker(&mut self, column: (usize, usize), container: Container) {
        self.column_blockers.entry(column).or_default().push(container);
    }

    pub fn queue_reload(&mut self, container: Container) {
        self.reload.push(container);
    }

    pub fn reject(&mut self, id: &str) {
        self.instructions.push(Instruction::reject(id));
    }

    /// 选位 + 配重确认
    ///
    /// 配重被拒的箱位加入本次调用的排除集合后重选; 排除集合随调用结束丢弃
    fn find_spot(
        &self,
        container: &Container,
        blocked_columns: &HashSet<(usize, usize)>,
    ) -> Option<SpotIndex> {
        let weight = container.weight_or_zero();
        let mut excluded: HashSet<SpotIndex> = HashSet::new();
        loop {
            let ctx = SelectionContext {
                ship: &*self.ship,
                route: self.route,
                excluded: &excluded,
                blocked_columns,
                far_ratio: self.far_ratio,
            };
            let spot = self.selector.select(&ctx, container)?;
            if excluded.contains(&spot) {
                return None;
            }
            if self.approves(BalanceOperation::Load, weight, spot) {
                return Some(spot);
            }
            debug!(container_id = %container.id, spot = %spot, "装箱位被配重拒绝, 排除后重选");
            excluded.insert(spot);
        }
    }

    fn insert(&mut self, at: SpotIndex, container: Container) -> Result<SpotIndex, Container> {
        match self.ship.insert_container(at, container.clone()) {
            Ok(()) => {
                self.instructions.push(Instruction::load(&container.id, at));
                Ok(at)
            }
            Err(e) => {
                debug!(container_id = %container.id, spot = %at, error = %e, "装箱失败");
                Err(container)
            }
        }
    }

    /// 按选位规则装箱并追加 L 指令
    pub fn load(&mut self, container: Container) -> Result<SpotIndex, Container> {
        match self.find_spot(&container, &HashSet::new()) {
            Some(at) => self.insert(at, container),
            None => Err(container),
        }
    }

    /// 将集装箱装回指定列的最低空位
    pub fn restack(&mut self, column: (usize, usize), container: Container) -> Result<(), Container> {
        let at = match self.ship.get_first_free_spot_in(column.0, column.1) {
            Some(at) => at,
            None => return Err(container),
        };
        if !self.approves(BalanceOperation::Load, container.weight_or_zero(), at) {
            return Err(container);
        }
        self.insert(at, container).map(|_| ())
    }

    /// 将列顶阻挡箱移到其他列并追加 M 指令
    ///
    /// 目标列不得含本港箱, 也不得是原列
    pub fn relocate(&mut self, from: SpotIndex) -> bool {
        let container = match self.ship.container_at(from) {
            Some(c) => c.clone(),
            None => return false,
        };
        if self.ship.has_container_above(from)
            || !self.approves(BalanceOperation::Unload, container.weight_or_zero(), from)
        {
            return false;
        }

        let mut blocked = self.columns_holding(&self.port_code);
        blocked.insert(from.column());
        let to = match self.find_spot(&container, &blocked) {
            Some(to) => to,
            None => return false,
        };

        match self.ship.move_container(from, to) {
            Ok(()) => {
                self.instructions
                    .push(Instruction::relocate(&container.id, from, to));
                true
            }
            Err(e) => {
                debug!(container_id = %container.id, error = %e, "移箱失败");
                false
            }
        }
    }

    /// 将列顶连续阻挡段逐箱移到同一目标列并追加 M 指令
    ///
    /// 目标列须能容纳整段, 不含本港箱, 且不是原列; 列顶为空或与阻挡段同目的港的列优先
    ///
    /// # 参数
    /// - top: 阻挡段顶部箱位
    /// - count: 阻挡段箱数（自顶向下）
    ///
    /// # 返回
    /// 实际移动的箱数; 0 表示没有可容纳整段的目标列
    pub fn relocate_run(&mut self, top: SpotIndex, count: usize) -> usize {
        let destination = match self.ship.container_at(top) {
            Some(c) => c.destination.clone(),
            None => return 0,
        };
        if count == 0 || count > top.floor + 1 {
            return 0;
        }

        let blocked = self.columns_holding(&self.port_code);
        let mut candidates: Vec<((usize, usize), bool)> = Vec::new();
        for x in 0..self.ship.rows() {
            for y in 0..self.ship.cols() {
                if (x, y) == top.column() || blocked.contains(&(x, y)) {
                    continue;
                }
                let room = self.ship.column(x, y).filter(|s| s.is_free()).count();
                if room < count {
                    continue;
                }
                let stacks_well = self
                    .ship
                    .top_container(x, y)
                    .map(|c| c.destination == destination)
                    .unwrap_or(true);
                candidates.push(((x, y), stacks_well));
            }
        }
        // 稳定排序, 同优先级保持列扫描顺序
        candidates.sort_by_key(|(_, stacks_well)| !*stacks_well);
        let target = match candidates.first() {
            Some((column, _)) => *column,
            None => return 0,
        };

        let mut moved = 0;
        while moved < count {
            let from = SpotIndex::new(top.floor - moved, top.x, top.y);
            let container = match self.ship.container_at(from) {
                Some(c) => c.clone(),
                None => break,
            };
            let to = match self.ship.get_first_free_spot_in(target.0, target.1) {
                Some(to) => to,
                None => break,
            };
            let weight = container.weight_or_zero();
            if !self.approves(BalanceOperation::Unload, weight, from)
                || !self.approves(BalanceOperation::Load, weight, to)
            {
                debug!(container_id = %container.id, from = %from, to = %to, "整段移箱被配重拒绝");
                break;
            }
            if let Err(e) = self.ship.move_container(from, to) {
                debug!(container_id = %container.id, error = %e, "整段移箱失败");
                break;
            }
            self.instructions
                .push(Instruction::relocate(&container.id, from, to));
            moved += 1;
        }
        moved
    }

    fn columns_holding(&self, destination: &str) -> HashSet<(usize, usize)> {
        self.ship
            .containers_for_destination(destination)
            .iter()
            .filter_map(|c| c.spot())
            .map(|spot| spot.column())
            .collect()
    }

    fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }
}

// ==========================================
// PortPlanner - 可配置规划器
// ==========================================
pub struct PortPlanner {
    name: String,
    selector: Box<dyn SpotSelector>,
    blockers: Box<dyn BlockerHandler>,
    order: DestinationOrder,
    settings: PlannerSettings,
    policy: Box<dyn WeightBalancePolicy>,
    ship: Option<ShipPlan>,
    route: Option<Route>,
    phase: PlanPhase,
}

impl PortPlanner {
    pub fn new(
        name: &str,
        selector: Box<dyn SpotSelector>,
        blockers: Box<dyn BlockerHandler>,
        order: DestinationOrder,
        settings: PlannerSettings,
    ) -> Self {
        Self {
            name: name.to_string(),
            selector,
            blockers,
            order,
            settings,
            policy: Box::new(ApproveAllPolicy),
            ship: None,
            route: None,
            phase: PlanPhase::Idle,
        }
    }

    pub fn from_definition(definition: &StrategyDefinition, settings: PlannerSettings) -> Self {
        Self::new(
            &definition.name,
            Box::new(RuleChainSelector::new(definition.spot_rules.clone())),
            handler_for(definition.blockers),
            definition.order,
            settings,
        )
    }

    /// 直接装入船舶与航线（不经文件读取）
    pub fn with_state(mut self, ship: ShipPlan, route: Route) -> Self {
        self.ship = Some(ship);
        self.route = Some(route);
        self
    }

    pub fn phase(&self) -> PlanPhase {
        self.phase
    }

    pub fn order(&self) -> DestinationOrder {
        self.order
    }

    pub fn ship(&self) -> Option<&ShipPlan> {
        self.ship.as_ref()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }
}

impl StowagePlanner for PortPlanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_ship_plan(&mut self, path: &Path) -> DiagnosticSet {
        let load = ShipPlanReader::new().read(path);
        self.ship = load.plan;
        load.diagnostics
    }

    fn read_route(&mut self, path: &Path) -> DiagnosticSet {
        let load = RouteReader::new().read(path);
        self.route = load.route;
        load.diagnostics
    }

    fn set_balance_policy(&mut self, policy: Box<dyn WeightBalancePolicy>) {
        self.policy = policy;
    }

    fn plan_port(&mut self, manifest: Option<&Path>) -> PortPlan {
        let (ship, route) = match (self.ship.as_mut(), self.route.as_mut()) {
            (Some(ship), Some(route)) => (ship, route),
            _ => {
                warn!(strategy = %self.name, "船型或航线未加载, 无法规划");
                return PortPlan::default();
            }
        };

        let mut call = match route.advance_to_next_port() {
            Some(call) => call,
            None => {
                warn!(strategy = %self.name, "航线已结束, 无法规划");
                return PortPlan::default();
            }
        };
        call.manifest = manifest.map(Path::to_path_buf);

        let load = ManifestReader::new(self.settings.strict_check_digit).read_port(call, ship);
        let mut reported = load.diagnostics;

        let mut ws = PortWorkspace::new(
            ship,
            &*route,
            self.policy.as_ref(),
            self.selector.as_ref(),
            self.settings.far_ratio,
            &load.call.code,
        );

        // 步骤1: 卸本港箱, 沿途处理阻挡箱
        self.phase = PlanPhase::UnloadDestined;
        unload_destined(&mut ws, self.blockers.as_ref());

        // 步骤2: 阻挡箱归位或进入重装队列
        self.phase = PlanPhase::RelocateBlockers;
        let held = std::mem::take(&mut ws.column_blockers);
        for (column, blockers) in held {
            self.blockers.settle_column(&mut ws, column, blockers);
        }

        // 步骤3: 拒装不合格箱, 按目的港优先级装箱
        self.phase = PlanPhase::LoadNew;
        if load_new(&mut ws, &load.port, self.order) {
            reported.insert(DiagnosticCode::ManifestExceedsCapacity);
        }

        self.phase = PlanPhase::Done;
        let instructions = ws.into_instructions();

        info!(
            strategy = %self.name,
            port = %load.call.code,
            visit = load.call.visit,
            instructions = instructions.len(),
            "本港规划完成"
        );

        PortPlan {
            instructions,
            reported,
        }
    }
}

// ==========================================
// 规划步骤
// ==========================================

// 逐列自顶向下卸到最低一个本港箱
fn unload_destined(ws: &mut PortWorkspace<'_>, blockers: &dyn BlockerHandler) {
    let port = ws.port_code.clone();

    for x in 0..ws.ship.rows() {
        for y in 0..ws.ship.cols() {
            let lowest = ws
                .ship
                .column(x, y)
                .find(|s| s.occupant().map(|c| c.destination == port).unwrap_or(false))
                .map(|s| s.index().floor);
            let lowest = match lowest {
                Some(floor) => floor,
                None => continue,
            };
            let top = ws
                .ship
                .column(x, y)
                .filter(|s| s.is_occupied())
                .map(|s| s.index().floor)
                .last()
                .unwrap_or(lowest);

            for floor in (lowest..=top).rev() {
                let at = SpotIndex::new(floor, x, y);
                let destined = match ws.ship.container_at(at) {
                    Some(c) => c.destination == port,
                    None => continue,
                };
                let done = if destined {
                    ws.unload(at).is_some()
                } else {
                    blockers.take_blocker(ws, at)
                };
                if !done {
                    warn!(port = %port, spot = %at, "卸箱无法执行, 该列停止处理");
                    break;
                }
            }
        }
    }
}

// 返回是否因空间不足拒装了合格箱
fn load_new(ws: &mut PortWorkspace<'_>, port: &Port, order: DestinationOrder) -> bool {
    let current = ws.port_code.clone();

    // 拒装: 无效、本港箱、不在剩余航线
    let mut survivors: Vec<Container> = Vec::new();
    for container in port.waiting_containers() {
        let reason = if !container.is_valid() {
            Some("无效箱")
        } else if container.destination == current {
            Some("目的港为当前港")
        } else if !ws.route.is_in_remaining_route(&container.destination) {
            Some("目的港不在剩余航线")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                debug!(container_id = %container.id, reason, "拒装");
                ws.reject(&container.id);
            }
            None => survivors.push(container.clone()),
        }
    }

    // 重复箱号每份副本各拒装一次
    for (id, count) in port.outstanding_duplicates() {
        for _ in 0..count {
            ws.reject(id);
        }
    }

    // 重装箱与新箱合并排序
    let mut queue: Vec<(bool, Container)> = std::mem::take(&mut ws.reload)
        .into_iter()
        .map(|c| (true, c))
        .chain(survivors.into_iter().map(|c| (false, c)))
        .collect();
    ws.route
        .sort_by_destination(&mut queue, order, |item| item.1.destination.as_str());

    // 为尚未装回的阻挡箱预留空位
    let mut reloads_pending = queue.iter().filter(|(is_reload, _)| *is_reload).count();
    let mut deferred: Vec<Container> = Vec::new();
    let mut capacity_short = false;

    for (is_reload, container) in queue {
        if is_reload {
            reloads_pending -= 1;
            if let Err(container) = ws.load(container) {
                warn!(port = %current, container_id = %container.id, "阻挡箱无法重新装船");
            }
            continue;
        }

        if ws.ship.free_spots() <= reloads_pending {
            deferred.push(container);
            continue;
        }
        if let Err(container) = ws.load(container) {
            capacity_short = true;
            ws.reject(&container.id);
        }
    }

    for container in deferred {
        if let Err(container) = ws.load(container) {
            capacity_short = true;
            ws.reject(&container.id);
        }
    }

    if capacity_short {
        info!(port = %current, "空间不足, 部分合格箱被拒装");
    }
    capacity_short
}
