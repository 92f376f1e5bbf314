// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use ship_stowage::config::{ConfigResult, SimulationConfigReader, StrategyProfile};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub num_threads: usize,
    pub far_destination_ratio: f64,
    pub strict_check_digit: bool,
    pub write_instruction_files: bool,
    pub enabled_strategies: Vec<String>,
    pub profiles: Vec<StrategyProfile>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            num_threads: 1,
            far_destination_ratio: 0.8,
            strict_check_digit: false,
            write_instruction_files: true,
            enabled_strategies: Vec::new(),
            profiles: Vec::new(),
        }
    }
}

impl MockConfig {
    /// 指定线程数
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }

    /// 仅启用指定策略
    pub fn only(strategies: &[&str]) -> Self {
        Self {
            enabled_strategies: strategies.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl SimulationConfigReader for MockConfig {
    fn get_num_threads(&self) -> usize {
        self.num_threads
    }

    fn get_far_destination_ratio(&self) -> f64 {
        self.far_destination_ratio
    }

    fn get_strict_check_digit(&self) -> bool {
        self.strict_check_digit
    }

    fn get_write_instruction_files(&self) -> bool {
        self.write_instruction_files
    }

    fn get_enabled_strategies(&self) -> Vec<String> {
        self.enabled_strategies.clone()
    }

    fn get_custom_strategy_profiles(&self) -> ConfigResult<Vec<StrategyProfile>> {
        Ok(self.profiles.clone())
    }
}
