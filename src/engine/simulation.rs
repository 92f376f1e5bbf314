// ==========================================
// 集装箱配载仿真系统 - 单航次仿真
// ==========================================
// 职责: 一个 (策略, 航次) 任务 = 规划器逐港出指令 + 校验器逐条回放
// 红线: 规划器与校验器各自持有船舶/航线/配重策略实例, 互不共享
// 红线: 任务内同步执行到底, 无中途挂起
// ==========================================

use crate::domain::diagnostic::DiagnosticSet;
use crate::domain::route::{PortCall, Route};
use crate::domain::ship_plan::ShipPlan;
use crate::domain::types::INSTRUCTION_EXTENSION;
use crate::engine::balance::BalancePolicyFactory;
use crate::engine::planner::PlannerSettings;
use crate::engine::registry::StrategyHandle;
use crate::engine::validation::{ValidationEngine, ValidationIssue};
use crate::importer::{RouteReader, ShipPlanReader, TravelFiles};
use crate::perf::{record_instructions, PerfGuard};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

// ==========================================
// SimulationSettings - 任务共享的只读设置
// ==========================================
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub planner: PlannerSettings,
    pub write_instruction_files: bool,
    pub output_dir: PathBuf,
}

impl SimulationSettings {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            planner: PlannerSettings::default(),
            write_instruction_files: true,
            output_dir: output_dir.to_path_buf(),
        }
    }
}

// ==========================================
// 航次准备
// ==========================================

/// 已通过初始化的航次（所有策略共用的只读快照）
#[derive(Debug, Clone)]
pub struct PreparedTravel {
    pub files: TravelFiles,
    pub ship: ShipPlan,

    /// 已分配舱单文件的航线
    pub route: Route,

    /// 船型与航线读取时的诊断码
    pub setup_diagnostics: DiagnosticSet,

    /// 航次级提示（无法分配的舱单文件、无法识别的文件）
    pub warnings: Vec<String>,
}

impl PreparedTravel {
    pub fn name(&self) -> &str {
        &self.files.name
    }
}

/// 航次准备结果
#[derive(Debug, Clone)]
pub enum TravelSetup {
    Ready(PreparedTravel),

    /// 船型或航线无法使用, 该航次对所有策略跳过
    Removed { travel: String, reason: String },
}

/// 读取航次目录并构建初始船舶与航线
///
/// # 返回
/// - Removed: 目录缺文件、船型或航线含致命诊断码
pub fn prepare_travel(dir: &Path) -> TravelSetup {
    let travel = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string());
    let removed = |reason: String| {
        warn!(travel = %travel, reason = %reason, "航次无法执行, 已移除");
        TravelSetup::Removed {
            travel: travel.clone(),
            reason,
        }
    };

    // 步骤1: 定位航次文件
    let files = match TravelFiles::locate(dir) {
        Ok(files) => files,
        Err(e) => return removed(e.to_string()),
    };

    // 步骤2: 船型
    let plan_load = ShipPlanReader::new().read(&files.ship_plan);
    let mut setup_diagnostics = plan_load.diagnostics;
    let ship = match plan_load.plan {
        Some(ship) if !plan_load.diagnostics.is_fatal() => ship,
        _ => return removed(describe_fatal("船型文件无法使用", plan_load.diagnostics)),
    };

    // 步骤3: 航线
    let route_load = RouteReader::new().read(&files.route);
    setup_diagnostics |= route_load.diagnostics;
    let mut route = match route_load.route {
        Some(route) if !route_load.diagnostics.is_fatal() => route,
        _ => return removed(describe_fatal("航线文件无法使用", route_load.diagnostics)),
    };

    // 步骤4: 舱单文件分配
    let mut warnings: Vec<String> = route
        .assign_manifests(files.cargo_files.clone())
        .iter()
        .map(|r| r.to_string())
        .collect();
    warnings.extend(
        files
            .ignored_files
            .iter()
            .map(|p| format!("无法识别的文件 {} (忽略)", p.display())),
    );

    debug!(
        travel = %travel,
        capacity = ship.capacity(),
        ports = route.len(),
        warnings = warnings.len(),
        "航次准备完成"
    );

    TravelSetup::Ready(PreparedTravel {
        files,
        ship,
        route,
        setup_diagnostics,
        warnings,
    })
}

fn describe_fatal(prefix: &str, diagnostics: DiagnosticSet) -> String {
    let details: Vec<String> = diagnostics
        .iter()
        .filter(|c| c.is_fatal())
        .map(|c| c.to_string())
        .collect();
    if details.is_empty() {
        prefix.to_string()
    } else {
        format!("{}: {}", prefix, details.join("; "))
    }
}

// ==========================================
// TravelOutcome - 单个任务的结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct TravelOutcome {
    pub strategy: String,
    pub travel: String,

    /// L/U/M 指令数
    pub operations: usize,
    pub issues: Vec<ValidationIssue>,

    /// 规划器自报的诊断码（不影响得分）
    pub reported: DiagnosticSet,

    /// 指令文件写出失败等提示
    pub output_problems: Vec<String>,
}

impl TravelOutcome {
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
}

// ==========================================
// 仿真执行
// ==========================================

/// 运行一个 (策略, 航次) 任务
///
/// # 参数
/// - handle: 策略句柄（任务内创建新的规划器实例）
/// - travel: 航次快照（校验器克隆后独占）
/// - settings: 共享只读设置
/// - balance: 配重策略工厂（规划器与校验器各取一个实例）
#[instrument(skip_all, fields(strategy = %handle.name(), travel = %travel.name()))]
pub fn simulate_travel(
    handle: &StrategyHandle,
    travel: &PreparedTravel,
    settings: &SimulationSettings,
    balance: &BalancePolicyFactory,
) -> TravelOutcome {
    let _perf = PerfGuard::new("simulate_travel", handle.name(), travel.name());

    // 步骤1: 规划器自行读取船型与航线
    let mut planner = handle.create();
    let mut reported = planner.read_ship_plan(&travel.files.ship_plan);
    reported |= planner.read_route(&travel.files.route);
    planner.set_balance_policy(balance());

    // 步骤2: 校验器使用独立状态
    let mut validator = ValidationEngine::new(
        travel.name(),
        travel.ship.clone(),
        travel.route.clone(),
        balance(),
        settings.planner.strict_check_digit,
    );

    let instruction_dir = settings.write_instruction_files.then(|| {
        settings
            .output_dir
            .join(format!("{}_{}_crane_instructions", handle.name(), travel.name()))
    });
    let mut output_problems = Vec::new();

    // 步骤3: 逐港规划并回放
    while let Some(call) = validator.begin_port() {
        let plan = planner.plan_port(call.manifest.as_deref());
        reported |= plan.reported;
        record_instructions(plan.instructions.len());

        let lines: Vec<String> = plan.instructions.iter().map(|i| i.to_string()).collect();
        if let Some(dir) = &instruction_dir {
            if let Err(e) = write_crane_instructions(dir, &call, &lines) {
                warn!(port = %call.code, visit = call.visit, error = %e, "指令文件写出失败");
                output_problems.push(format!(
                    "{} 第{}次挂靠的指令文件写出失败: {}",
                    call.code, call.visit, e
                ));
            }
        }

        for line in &lines {
            validator.process_line(line);
        }
    }

    // 步骤4: 汇总
    let (operations, issues) = validator.finish();
    info!(
        operations,
        issues = issues.len(),
        reported = reported.bits(),
        "航次仿真完成"
    );

    TravelOutcome {
        strategy: handle.name().to_string(),
        travel: travel.name().to_string(),
        operations,
        issues,
        reported,
        output_problems,
    }
}

/// 写出一次挂靠的吊机指令文件 `<PORT>_<visit>.crane_instructions`
pub fn write_crane_instructions(dir: &Path, call: &PortCall, lines: &[String]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_{}.{}", call.code, call.visit, INSTRUCTION_EXTENSION));
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(&path, content)?;
    Ok(path)
}
