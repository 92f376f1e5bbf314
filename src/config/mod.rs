// ==========================================
// 集装箱配载仿真系统 - 配置层
// ==========================================
// 职责: 运行配置管理, 支持配置文件 + 命令行覆写
// 存储: JSON 文件 (扁平 key-value)
// ==========================================

pub mod config_manager;
pub mod error;
pub mod sim_config_trait;
pub mod strategy_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use sim_config_trait::SimulationConfigReader;
pub use strategy_profile::{StrategyProfile, StrategyProfileParameters};
