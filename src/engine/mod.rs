// ==========================================
// 集装箱配载仿真系统 - 引擎层
// ==========================================
// 职责: 配载规划、指令校验、仿真执行与结果汇总
// 红线: 规划器与校验器状态互相独立, 只通过指令文本交互
// ==========================================

pub mod balance;
pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod registry;
pub mod results;
pub mod simulation;
pub mod strategy;
pub mod validation;

// 重导出核心引擎
pub use balance::{approve_all_factory, BalancePolicyFactory, BalanceVerdict, WeightBalancePolicy};
pub use error::{EngineError, EngineResult};
pub use orchestrator::{RunReport, RunRequest, SimulationOrchestrator, TravelDiscovery};
pub use planner::{PlannerSettings, PortPlan, PortPlanner, StowagePlanner};
pub use registry::{BuiltinStrategyLoader, LoadedStrategies, StrategyHandle, StrategyLoader, StrategyRegistry};
pub use results::{ErrorReport, ResultMatrix, ResultsTable, RunSummary};
pub use simulation::{prepare_travel, simulate_travel, PreparedTravel, SimulationSettings, TravelOutcome, TravelSetup};
pub use strategy::{BlockerPolicy, SpotRule, StrategyDefinition, StrategyKind};
pub use validation::{IssueKind, ValidationEngine, ValidationIssue};
