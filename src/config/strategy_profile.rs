use serde::{Deserialize, Serialize};

/// 自定义规划策略（配置对象）
///
/// 存储位置：配置文件（key='custom_strategy/{strategy_id}'）或 algorithm_path 下的 *.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    /// 自定义策略 ID（结果表中的行名）
    pub strategy_id: String,

    /// 显示名称（中文）
    #[serde(default)]
    pub title: Option<String>,

    /// 说明（可选）
    #[serde(default)]
    pub description: Option<String>,

    /// 基于哪个内置策略（naive_scan/same_dest_stack/ground_first_move/run_detach/reverse_scan）
    pub base_strategy: String,

    /// 覆盖项（未填写的沿用内置策略）
    #[serde(default)]
    pub parameters: StrategyProfileParameters,
}

/// 自定义策略覆盖项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StrategyProfileParameters {
    /// 选位规则链（same_destination/far_to_ground/scan_forward/scan_reverse）
    #[serde(default)]
    pub spot_rules: Option<Vec<String>>,

    /// 阻挡箱处理（reload/move_in_place/detach_runs）
    #[serde(default)]
    pub blocker_policy: Option<String>,

    /// 装箱顺序（nearest_first/farthest_first）
    #[serde(default)]
    pub destination_order: Option<String>,
}
