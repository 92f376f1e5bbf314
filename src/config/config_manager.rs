// ==========================================
// 集装箱配载仿真系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: JSON 文件 (扁平 key-value), 命令行参数可覆写
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::sim_config_trait::SimulationConfigReader;
use crate::config::strategy_profile::StrategyProfile;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: BTreeMap<String, String>,
}

impl ConfigManager {
    /// 创建空配置（全部使用默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 配置文件加载
    ///
    /// # 参数
    /// - path: 配置文件路径, 顶层必须是对象
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path)?;
        let manager = Self::from_json_str(&raw)?;
        debug!(path = %path.display(), keys = manager.values.len(), "配置文件加载完成");
        Ok(manager)
    }

    /// 从 JSON 文本加载
    ///
    /// 非字符串值（数字、布尔、对象）按 JSON 文本保存
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let parsed: Value = serde_json::from_str(raw)?;
        let object = match parsed {
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::ParseError(format!(
                    "顶层必须是 JSON 对象, 实际为: {}",
                    other
                )))
            }
        };

        let values = object
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();
        Ok(Self { values })
    }

    /// 覆写配置项
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn get_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// 读取配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Option<&str> {
        self.get_config_value(key)
    }

    /// 读取配置值，格式错误时告警并使用默认值
    ///
    /// # 参数
    /// - key: 配置键
    /// - default: 默认值
    fn get_config_or_default<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Copy,
    {
        match self.get_config_value(key) {
            None => default,
            Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
                warn!(config_key = key, raw_value = %raw, "配置项格式错误，使用默认值");
                default
            }),
        }
    }

    fn get_bool_or_default(&self, key: &str, default: bool) -> bool {
        match self.get_config_value(key) {
            None => default,
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                warn!(config_key = key, raw_value = %raw, "布尔配置项格式错误，使用默认值");
                default
            }),
        }
    }

    /// 读取自定义策略配置（key: custom_strategy/{strategy_id}）
    pub fn get_custom_strategy_profile(&self, strategy_id: &str) -> ConfigResult<Option<StrategyProfile>> {
        let id = strategy_id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        let key = format!("{}{}", config_keys::CUSTOM_STRATEGY_PREFIX, id);
        let raw = match self.get_config_value(&key) {
            Some(v) => v,
            None => return Ok(None),
        };

        let mut profile: StrategyProfile =
            serde_json::from_str(raw).map_err(|e| ConfigError::InvalidProfile {
                id: id.to_string(),
                message: e.to_string(),
            })?;
        if profile.strategy_id.trim().is_empty() {
            profile.strategy_id = id.to_string();
        }
        Ok(Some(profile))
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 写入 run_summary.json, 便于复现一次运行
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let json_value = json!(self.values);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// SimulationConfigReader Trait 实现
// ==========================================
impl SimulationConfigReader for ConfigManager {
    fn get_num_threads(&self) -> usize {
        let value = self.get_config_or_default(config_keys::NUM_THREADS, 1usize);
        if value == 0 {
            warn!(config_key = config_keys::NUM_THREADS, "线程数不能为 0，使用 1");
            return 1;
        }
        value
    }

    fn get_far_destination_ratio(&self) -> f64 {
        let value = self.get_config_or_default(config_keys::FAR_DESTINATION_RATIO, 0.8f64);
        if !(value > 0.0 && value <= 1.0) {
            warn!(
                config_key = config_keys::FAR_DESTINATION_RATIO,
                value,
                "远港比例须在 (0, 1] 区间，使用默认值"
            );
            return 0.8;
        }
        value
    }

    fn get_strict_check_digit(&self) -> bool {
        self.get_bool_or_default(config_keys::STRICT_CHECK_DIGIT, false)
    }

    fn get_write_instruction_files(&self) -> bool {
        self.get_bool_or_default(config_keys::WRITE_INSTRUCTION_FILES, true)
    }

    fn get_enabled_strategies(&self) -> Vec<String> {
        self.get_config_value(config_keys::ENABLED_STRATEGIES)
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn get_custom_strategy_profiles(&self) -> ConfigResult<Vec<StrategyProfile>> {
        let ids: Vec<&str> = self
            .values
            .keys()
            .filter_map(|k| k.strip_prefix(config_keys::CUSTOM_STRATEGY_PREFIX))
            .collect();

        let mut profiles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(profile) = self.get_custom_strategy_profile(id)? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    fn get_config_snapshot_json(&self) -> Option<serde_json::Value> {
        serde_json::to_value(&self.values).ok()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 并发
    pub const NUM_THREADS: &str = "num_threads";

    // 规划器
    pub const FAR_DESTINATION_RATIO: &str = "far_destination_ratio";
    pub const STRICT_CHECK_DIGIT: &str = "strict_check_digit";

    // 输出
    pub const WRITE_INSTRUCTION_FILES: &str = "write_instruction_files";

    // 策略
    pub const ENABLED_STRATEGIES: &str = "enabled_strategies";
    pub const CUSTOM_STRATEGY_PREFIX: &str = "custom_strategy/";
}
