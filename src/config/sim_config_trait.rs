// ==========================================
// 集装箱配载仿真系统 - 仿真配置读取 Trait
// ==========================================
// 职责: 定义编排器与规划器所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::config::strategy_profile::StrategyProfile;

// ==========================================
// SimulationConfigReader Trait
// ==========================================
// 用途: 仿真运行所需的配置读取接口
// 实现者: ConfigManager（从 JSON 配置文件读取）
pub trait SimulationConfigReader: Send + Sync {
    // ===== 并发配置 =====

    /// 获取工作线程数
    ///
    /// # 默认值
    /// - 1（同步执行）
    fn get_num_threads(&self) -> usize;

    // ===== 规划器配置 =====

    /// 获取远港判定比例
    ///
    /// # 返回
    /// - f64: 距离 >= 比例 × 剩余港口数 即为远港
    ///
    /// # 默认值
    /// - 0.8
    fn get_far_destination_ratio(&self) -> f64;

    /// 箱号是否校验 ISO 6346 校验码
    ///
    /// # 默认值
    /// - false
    fn get_strict_check_digit(&self) -> bool;

    // ===== 输出配置 =====

    /// 是否写出逐港吊机指令文件
    ///
    /// # 默认值
    /// - true
    fn get_write_instruction_files(&self) -> bool;

    // ===== 策略配置 =====

    /// 获取启用的策略名列表
    ///
    /// # 返回
    /// - 空列表: 启用全部已注册策略
    fn get_enabled_strategies(&self) -> Vec<String>;

    /// 获取配置中的全部自定义策略（按 strategy_id 排序）
    fn get_custom_strategy_profiles(&self) -> ConfigResult<Vec<StrategyProfile>>;

    /// 配置快照（写入运行元数据）
    fn get_config_snapshot_json(&self) -> Option<serde_json::Value> {
        None
    }
}
