// ==========================================
// 集装箱配载仿真系统 - 核心库
// ==========================================
// 系统定位: 配载策略离线仿真与评测
// 输入: 航次目录 (船型 / 航线 / 逐港舱单)
// 输出: 吊机指令文件 + 结果表 + 错误报告
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 航次文件读取
pub mod importer;

// 引擎层 - 规划、校验与仿真
pub mod engine;

// 配置层 - 运行配置
pub mod config;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    Container, DiagnosticCode, DiagnosticSet, Instruction, InstructionKind, Port, Route, ShipPlan,
};

// 引擎
pub use engine::{
    PortPlanner, RunRequest, SimulationOrchestrator, StowagePlanner, StrategyKind,
    ValidationEngine,
};

// 配置
pub use config::{ConfigManager, SimulationConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "集装箱配载仿真系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_builtin_strategies_exposed() {
        assert_eq!(StrategyKind::ALL.len(), 5);
    }
}
