// ==========================================
// 集装箱配载仿真系统 - 指令校验引擎
// ==========================================
// 职责: 以独立构建的船舶/航线状态回放指令流, 合法指令生效, 非法指令记录
// 红线: 非法指令不生效, 但后续指令、港口继续校验
// 红线: 校验器的船舶与规划器的船舶互不共享
// ==========================================

use super::report::{IssueKind, ValidationIssue};
use crate::domain::container::{is_valid_container_id, Container};
use crate::domain::instruction::Instruction;
use crate::domain::port::Port;
use crate::domain::route::{PortCall, Route};
use crate::domain::ship_plan::{ShipPlan, SpotIndex};
use crate::engine::balance::{BalanceOperation, WeightBalancePolicy};
use crate::importer::ManifestReader;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

pub(super) type CheckResult = Result<(), (IssueKind, String)>;

// ==========================================
// PortState - 当前港口的校验状态
// ==========================================
pub(super) struct PortState {
    pub(super) call: PortCall,
    pub(super) port: Port,

    /// 已收到 L 或 R 的待装箱号
    pub(super) handled: HashSet<String>,

    /// 本港从待装列表装船的箱号（按装船顺序）
    pub(super) loaded: Vec<String>,

    /// 本港卸下且尚未装回的非本港箱
    pub(super) unloaded: BTreeMap<String, Container>,

    /// 船满时拒装的合格箱, 港口结束时复核
    pub(super) potential_rejects: Vec<String>,
}

impl PortState {
    fn new(call: PortCall, port: Port) -> Self {
        Self {
            call,
            port,
            handled: HashSet::new(),
            loaded: Vec::new(),
            unloaded: BTreeMap::new(),
            potential_rejects: Vec::new(),
        }
    }
}

// 装箱来源
enum LoadSource {
    Waiting,
    Reload,
}

// ==========================================
// ValidationEngine - 校验引擎
// ==========================================
pub struct ValidationEngine {
    pub(super) travel: String,
    pub(super) ship: ShipPlan,
    pub(super) route: Route,
    pub(super) policy: Box<dyn WeightBalancePolicy>,
    pub(super) manifests: ManifestReader,
    pub(super) strict_check_digit: bool,
    pub(super) state: Option<PortState>,
    pub(super) operations: usize,
    pub(super) issues: Vec<ValidationIssue>,
}

impl ValidationEngine {
    /// 创建校验引擎
    ///
    /// # 参数
    /// - travel: 航次名
    /// - ship: 初始船舶（校验器独占）
    /// - route: 已分配舱单文件的航线
    /// - policy: 校验器专用配重策略实例
    /// - strict_check_digit: 箱号是否校验第 11 位
    pub fn new(
        travel: &str,
        ship: ShipPlan,
        route: Route,
        policy: Box<dyn WeightBalancePolicy>,
        strict_check_digit: bool,
    ) -> Self {
        Self {
            travel: travel.to_string(),
            ship,
            route,
            policy,
            manifests: ManifestReader::new(strict_check_digit),
            strict_check_digit,
            state: None,
            operations: 0,
            issues: Vec::new(),
        }
    }

    // ==========================================
    // 港口推进
    // ==========================================

    /// 推进到下一港并读取舱单
    ///
    /// 上一港尚未结束时先执行港口结束检查
    ///
    /// # 返回
    /// - None: 航线已结束
    pub fn begin_port(&mut self) -> Option<PortCall> {
        if self.state.is_some() {
            self.end_port();
        }
        let load = self.manifests.advance(&mut self.route, &self.ship)?;
        let call = load.call.clone();
        debug!(
            travel = %self.travel,
            port = %call.code,
            visit = call.visit,
            waiting = load.port.waiting_containers().len(),
            "校验器进入港口"
        );
        self.state = Some(PortState::new(load.call, load.port));
        Some(call)
    }

    pub fn current_port(&self) -> Option<&PortCall> {
        self.state.as_ref().map(|s| &s.call)
    }

    // ==========================================
    // 指令处理
    // ==========================================

    /// 校验一行指令文本
    pub fn process_line(&mut self, line: &str) -> bool {
        match line.parse::<Instruction>() {
            Ok(instruction) => self.process(&instruction),
            Err(e) => {
                self.record(IssueKind::InvalidInstruction, None, format!("{}: {}", e, line.trim()));
                false
            }
        }
    }

    /// 校验并执行一条指令
    ///
    /// # 返回
    /// - true: 合法且已生效
    pub fn process(&mut self, instruction: &Instruction) -> bool {
        if self.state.is_none() {
            self.record(
                IssueKind::InvalidInstruction,
                Some(instruction.container_id()),
                "当前没有进行中的港口".to_string(),
            );
            return false;
        }

        let result = match instruction {
            Instruction::Load { id, at } => self.apply_load(id, *at),
            Instruction::Unload { id, at } => self.apply_unload(id, *at),
            Instruction::Move { id, from, to } => self.apply_move(id, *from, *to),
            Instruction::Reject { id } => self.apply_reject(id),
        };

        match result {
            Ok(()) => {
                if instruction.counts_as_operation() {
                    self.operations += 1;
                }
                true
            }
            Err((kind, message)) => {
                self.record(kind, Some(instruction.container_id()), message);
                false
            }
        }
    }

    // ==========================================
    // Load: 范围 → 船满 → 箱位 → 来源箱 → 配重 → 悬空
    // ==========================================

    fn apply_load(&mut self, id: &str, at: SpotIndex) -> CheckResult {
        let (container, source) = self.check_load(id, at)?;
        self.ship
            .insert_container(at, container)
            .map_err(|e| (IssueKind::IllegalLoad, e.to_string()))?;

        if let Some(state) = self.state.as_mut() {
            match source {
                LoadSource::Waiting => {
                    state.handled.insert(id.to_string());
                    state.loaded.push(id.to_string());
                }
                LoadSource::Reload => {
                    state.unloaded.remove(id);
                }
            }
        }
        Ok(())
    }

    fn check_load(&self, id: &str, at: SpotIndex) -> Result<(Container, LoadSource), (IssueKind, String)> {
        let illegal = |message: String| (IssueKind::IllegalLoad, message);
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| illegal("当前没有进行中的港口".to_string()))?;

        if !self.ship.index_in_range(at) {
            return Err(illegal(format!("箱位 {} 超出范围", at)));
        }
        if self.ship.is_full() {
            return Err(illegal("船已满".to_string()));
        }
        check_spot_free(&self.ship, at).map_err(illegal)?;

        let (container, source) = if let Some(c) = state.unloaded.get(id) {
            (c.clone(), LoadSource::Reload)
        } else if let Some(c) = state.port.waiting_container(id) {
            if state.handled.contains(id) {
                return Err(illegal("该箱本港已处理".to_string()));
            }
            if let Some(reason) = c.invalid_reason() {
                return Err(illegal(format!("无效箱不可装船: {}", reason)));
            }
            if self.ship.is_container_aboard(id) {
                return Err(illegal("箱号已在船上".to_string()));
            }
            if state.port.duplicate_count(id) > 0 {
                return Err(illegal("重复箱号副本尚未拒装".to_string()));
            }
            if c.destination == state.call.code {
                return Err(illegal("目的港为当前港".to_string()));
            }
            if !self.route.is_in_remaining_route(&c.destination) {
                return Err(illegal(format!("目的港 {} 不在剩余航线中", c.destination)));
            }
            (c.clone(), LoadSource::Waiting)
        } else {
            return Err(illegal("箱号不在本港舱单中".to_string()));
        };

        if !self.approves(BalanceOperation::Load, &container, at) {
            return Err(illegal(format!("配重策略拒绝装箱 {}", at)));
        }
        if !self.ship.is_supported(at) {
            return Err(illegal(format!("箱位 {} 下方悬空", at)));
        }
        Ok((container, source))
    }

    // ==========================================
    // Unload: 范围 → 箱位有箱 → 箱号匹配 → 配重 → 上方无箱
    // ==========================================

    fn apply_unload(&mut self, id: &str, at: SpotIndex) -> CheckResult {
        let illegal = |message: String| (IssueKind::IllegalUnload, message);
        self.check_spot_holds(id, at).map_err(illegal)?;
        if let Some(c) = self.ship.container_at(at) {
            if !self.approves(BalanceOperation::Unload, c, at) {
                return Err(illegal(format!("配重策略拒绝卸箱 {}", at)));
            }
        }
        if self.ship.has_container_above(at) {
            return Err(illegal(format!("箱位 {} 上方有箱", at)));
        }

        let container = self
            .ship
            .remove_container(at)
            .map_err(|e| illegal(e.to_string()))?;
        if let Some(state) = self.state.as_mut() {
            if container.destination != state.call.code {
                state.unloaded.insert(container.id.clone(), container);
            }
        }
        Ok(())
    }

    // ==========================================
    // Move: 源/目标箱位 → 非同列 → 配重 (卸+装) → 源上方无箱 → 目标不悬空
    // ==========================================

    fn apply_move(&mut self, id: &str, from: SpotIndex, to: SpotIndex) -> CheckResult {
        let illegal = |message: String| (IssueKind::IllegalMove, message);
        self.check_spot_holds(id, from)
            .map_err(|m| illegal(format!("源箱位: {}", m)))?;
        check_spot_free(&self.ship, to).map_err(|m| illegal(format!("目标箱位: {}", m)))?;
        if from.column() == to.column() {
            return Err(illegal(format!("同列仅换层的移箱 {} -> {}", from, to)));
        }

        if let Some(c) = self.ship.container_at(from) {
            if !self.approves(BalanceOperation::Unload, c, from)
                || !self.approves(BalanceOperation::Load, c, to)
            {
                return Err(illegal(format!("配重策略拒绝移箱 {} -> {}", from, to)));
            }
        }
        if self.ship.has_container_above(from) {
            return Err(illegal(format!("源箱位 {} 上方有箱", from)));
        }
        if !self.ship.is_supported(to) {
            return Err(illegal(format!("目标箱位 {} 下方悬空", to)));
        }

        self.ship
            .move_container(from, to)
            .map_err(|e| illegal(e.to_string()))
    }

    // ==========================================
    // Reject
    // ==========================================
    // 船有空位时拒装合格箱立即判错; 船满时记为待复核

    fn apply_reject(&mut self, id: &str) -> CheckResult {
        let illegal = |message: String| (IssueKind::IllegalReject, message);
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| illegal("当前没有进行中的港口".to_string()))?;

        // 副本先于格式检查消耗, 格式非法的重复箱号同样需要逐份拒装
        if state.port.take_duplicate(id) {
            return Ok(());
        }
        // 箱号格式非法的拒装始终合法
        if !is_valid_container_id(id, self.strict_check_digit) {
            state.handled.insert(id.to_string());
            return Ok(());
        }

        let container = state
            .port
            .waiting_container(id)
            .ok_or_else(|| illegal("箱号不在本港舱单中".to_string()))?;
        if state.loaded.iter().any(|l| l == id) {
            return Err(illegal("该箱本港已装船".to_string()));
        }
        if state.handled.contains(id) {
            return Err(illegal("该箱本港已处理".to_string()));
        }

        let must_reject = !container.is_valid()
            || container.destination == state.call.code
            || !self.route.is_in_remaining_route(&container.destination);
        state.handled.insert(id.to_string());

        if must_reject {
            return Ok(());
        }

        let free = self.ship.free_spots();
        if free > 0 {
            return Err((
                IssueKind::UnfairRejection,
                format!("合格箱被拒装, 船上仍有 {} 个空位", free),
            ));
        }
        state.potential_rejects.push(id.to_string());
        Ok(())
    }

    // ==========================================
    // 辅助
    // ==========================================

    fn approves(&self, op: BalanceOperation, container: &Container, at: SpotIndex) -> bool {
        self.policy
            .try_operation(op, container.weight_or_zero(), at.x, at.y)
            .is_approved()
    }

    // 箱位在范围内、可用、有箱且箱号匹配
    fn check_spot_holds(&self, id: &str, at: SpotIndex) -> Result<(), String> {
        if !self.ship.index_in_range(at) {
            return Err(format!("箱位 {} 超出范围", at));
        }
        let spot = self
            .ship
            .spot(at)
            .ok_or_else(|| format!("箱位 {} 超出范围", at))?;
        if !spot.is_available() {
            return Err(format!("箱位 {} 结构不可用", at));
        }
        match spot.occupant() {
            None => Err(format!("箱位 {} 为空", at)),
            Some(c) if c.id != id => Err(format!("箱位 {} 上的箱号为 {}", at, c.id)),
            Some(_) => Ok(()),
        }
    }

    pub(super) fn record(&mut self, kind: IssueKind, container_id: Option<&str>, message: String) {
        let (port, visit) = match &self.state {
            Some(state) => (state.call.code.clone(), state.call.visit),
            None => ("-".to_string(), 0),
        };
        self.push_issue(&port, visit, kind, container_id, message);
    }

    pub(super) fn push_issue(
        &mut self,
        port: &str,
        visit: usize,
        kind: IssueKind,
        container_id: Option<&str>,
        message: String,
    ) {
        warn!(
            travel = %self.travel,
            port,
            visit,
            container_id = container_id.unwrap_or("-"),
            kind = kind.as_str(),
            message = %message,
            "校验发现问题"
        );
        self.issues.push(ValidationIssue {
            travel: self.travel.clone(),
            port: port.to_string(),
            visit,
            container_id: container_id.map(|s| s.to_string()),
            kind,
            message,
        });
    }

    // ==========================================
    // 结果查询
    // ==========================================

    pub fn ship(&self) -> &ShipPlan {
        &self.ship
    }

    pub fn operations(&self) -> usize {
        self.operations
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty()
    }

    /// 航次得分: 无问题时为操作数, 否则 -1
    pub fn score(&self) -> i64 {
        if self.has_errors() {
            -1
        } else {
            self.operations as i64
        }
    }

    /// 结束航次（关闭尚未结束的港口）
    pub fn finish(mut self) -> (usize, Vec<ValidationIssue>) {
        if self.state.is_some() {
            self.end_port();
        }
        (self.operations, self.issues)
    }
}

// 箱位在范围内、可用且为空
fn check_spot_free(ship: &ShipPlan, at: SpotIndex) -> Result<(), String> {
    match ship.spot(at) {
        None => Err(format!("箱位 {} 超出范围", at)),
        Some(spot) if !spot.is_available() => Err(format!("箱位 {} 结构不可用", at)),
        Some(spot) if spot.is_occupied() => Err(format!("箱位 {} 已被占用", at)),
        Some(_) => Ok(()),
    }
}
