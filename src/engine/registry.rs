// ==========================================
// 集装箱配载仿真系统 - 策略注册表
// ==========================================
// 职责: 加载阶段收集 {name, factory} 句柄, 冻结后交给编排器
// 红线: 冻结后的 LoadedStrategies 不可变, 工作任务开始前加载必须完成
// ==========================================

use crate::config::{ConfigError, StrategyProfile};
use crate::domain::types::DestinationOrder;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::planner::{PlannerSettings, PortPlanner, StowagePlanner};
use crate::engine::strategy::{BlockerPolicy, SpotRule, StrategyDefinition, StrategyKind};
use anyhow::anyhow;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 规划器工厂（每个任务各自创建实例）
pub type PlannerFactory = Arc<dyn Fn() -> Box<dyn StowagePlanner> + Send + Sync>;

// ==========================================
// StrategyHandle - 不透明的策略句柄
// ==========================================
#[derive(Clone)]
pub struct StrategyHandle {
    name: String,
    factory: PlannerFactory,
}

impl StrategyHandle {
    pub fn new(name: &str, factory: PlannerFactory) -> Self {
        Self {
            name: name.to_string(),
            factory,
        }
    }

    /// 由策略定义构造句柄
    pub fn from_definition(definition: StrategyDefinition, settings: PlannerSettings) -> Self {
        let name = definition.name.clone();
        let factory: PlannerFactory = Arc::new(move || {
            Box::new(PortPlanner::from_definition(&definition, settings)) as Box<dyn StowagePlanner>
        });
        Self { name, factory }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 创建一个全新的规划器实例
    pub fn create(&self) -> Box<dyn StowagePlanner> {
        (self.factory)()
    }
}

impl fmt::Debug for StrategyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyHandle").field("name", &self.name).finish()
    }
}

// ==========================================
// StrategyLoader Trait
// ==========================================
// 用途: 策略发现机制的最小接口
// 实现者: BuiltinStrategyLoader
pub trait StrategyLoader {
    /// 加载全部策略
    ///
    /// # 参数
    /// - path: 算法目录（可选）
    ///
    /// # 返回
    /// 每个元素对应一个策略, 加载失败的以 Err 返回
    fn load_all(&self, path: Option<&Path>) -> Vec<EngineResult<StrategyHandle>>;
}

/// 内置策略 + 配置中的自定义策略 + 算法目录下的 *.json 策略
pub struct BuiltinStrategyLoader {
    settings: PlannerSettings,
    profiles: Vec<StrategyProfile>,
}

impl BuiltinStrategyLoader {
    pub fn new(settings: PlannerSettings) -> Self {
        Self {
            settings,
            profiles: Vec::new(),
        }
    }

    pub fn with_profiles(mut self, profiles: Vec<StrategyProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    fn handle_for_profile(&self, profile: &StrategyProfile) -> EngineResult<StrategyHandle> {
        let definition = definition_from_profile(profile)?;
        Ok(StrategyHandle::from_definition(definition, self.settings))
    }

    // 算法目录下每个 *.json 文件是一个 StrategyProfile
    fn load_dir(&self, dir: &Path) -> Vec<EngineResult<StrategyHandle>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(EngineError::Other(anyhow!(
                    "算法目录无法读取 {}: {}",
                    dir.display(),
                    e
                )))]
            }
        };

        let mut files: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        files.sort();

        files
            .into_iter()
            .map(|path| {
                let raw = fs::read_to_string(&path).map_err(ConfigError::from)?;
                let mut profile: StrategyProfile =
                    serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidProfile {
                        id: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                if profile.strategy_id.trim().is_empty() {
                    if let Some(stem) = path.file_stem() {
                        profile.strategy_id = stem.to_string_lossy().to_string();
                    }
                }
                debug!(path = %path.display(), strategy = %profile.strategy_id, "读取策略文件");
                self.handle_for_profile(&profile)
            })
            .collect()
    }
}

impl StrategyLoader for BuiltinStrategyLoader {
    fn load_all(&self, path: Option<&Path>) -> Vec<EngineResult<StrategyHandle>> {
        let mut loaded: Vec<EngineResult<StrategyHandle>> = StrategyKind::ALL
            .iter()
            .map(|kind| Ok(StrategyHandle::from_definition(kind.definition(), self.settings)))
            .collect();

        loaded.extend(self.profiles.iter().map(|p| self.handle_for_profile(p)));

        if let Some(dir) = path {
            loaded.extend(self.load_dir(dir));
        }
        loaded
    }
}

/// 将自定义策略解析为策略定义
///
/// 以内置策略为基础, 覆盖项逐一替换
pub fn definition_from_profile(profile: &StrategyProfile) -> EngineResult<StrategyDefinition> {
    let invalid = |message: String| ConfigError::InvalidProfile {
        id: profile.strategy_id.clone(),
        message,
    };

    let id = profile.strategy_id.trim();
    if id.is_empty() {
        return Err(invalid("strategy_id 为空".to_string()).into());
    }

    let base: StrategyKind = profile.base_strategy.parse().map_err(invalid)?;
    let mut definition = base.definition();
    definition.name = id.to_string();

    let params = &profile.parameters;
    if let Some(rules) = &params.spot_rules {
        definition.spot_rules = rules
            .iter()
            .map(|r| r.parse::<SpotRule>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
    }
    if let Some(policy) = &params.blocker_policy {
        definition.blockers = policy.parse::<BlockerPolicy>().map_err(invalid)?;
    }
    if let Some(order) = &params.destination_order {
        definition.order = order.parse::<DestinationOrder>().map_err(invalid)?;
    }
    Ok(definition)
}

// ==========================================
// StrategyRegistry - 加载阶段（可变）
// ==========================================
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    handles: Vec<StrategyHandle>,
    problems: Vec<String>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个策略句柄
    ///
    /// # 返回
    /// - Err(DuplicateStrategy): 同名策略已注册
    pub fn register(&mut self, handle: StrategyHandle) -> EngineResult<()> {
        if self.handles.iter().any(|h| h.name == handle.name) {
            return Err(EngineError::DuplicateStrategy(handle.name));
        }
        debug!(strategy = %handle.name, "注册策略");
        self.handles.push(handle);
        Ok(())
    }

    /// 通过加载器注册全部策略, 失败项记入加载问题
    pub fn load_from(&mut self, loader: &dyn StrategyLoader, path: Option<&Path>) {
        for result in loader.load_all(path) {
            let outcome = result.and_then(|handle| self.register(handle));
            if let Err(e) = outcome {
                warn!(error = %e, "策略加载失败");
                self.problems.push(e.to_string());
            }
        }
    }

    /// 记录一条加载阶段问题
    pub fn record_problem(&mut self, problem: String) {
        self.problems.push(problem);
    }

    /// 仅保留启用的策略（空列表表示全部启用）
    pub fn retain_enabled(&mut self, enabled: &[String]) {
        if enabled.is_empty() {
            return;
        }
        let wanted: HashSet<&str> = enabled.iter().map(|s| s.as_str()).collect();
        for name in &wanted {
            if !self.handles.iter().any(|h| h.name == *name) {
                warn!(strategy = %name, "启用列表中的策略未注册");
                self.problems.push(format!("启用列表中的策略未注册: {}", name));
            }
        }
        self.handles.retain(|h| wanted.contains(h.name.as_str()));
    }

    /// 结束加载阶段
    ///
    /// # 返回
    /// - Err(NoStrategies): 没有任何可运行策略
    pub fn freeze(self) -> EngineResult<LoadedStrategies> {
        if self.handles.is_empty() {
            return Err(EngineError::NoStrategies);
        }
        info!(
            strategies = self.handles.len(),
            problems = self.problems.len(),
            "策略加载阶段结束"
        );
        Ok(LoadedStrategies {
            handles: Arc::from(self.handles),
            problems: self.problems,
        })
    }
}

// ==========================================
// LoadedStrategies - 冻结后的策略集合（只读）
// ==========================================
#[derive(Debug, Clone)]
pub struct LoadedStrategies {
    handles: Arc<[StrategyHandle]>,
    problems: Vec<String>,
}

impl LoadedStrategies {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StrategyHandle> {
        self.handles.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyHandle> {
        self.handles.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.handles.iter().map(|h| h.name.clone()).collect()
    }

    /// 加载阶段的问题（写入错误报告的 General 段）
    pub fn problems(&self) -> &[String] {
        &self.problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyProfileParameters;
    use tempfile::TempDir;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_profile(id: &str, base: &str) -> StrategyProfile {
        StrategyProfile {
            strategy_id: id.to_string(),
            title: None,
            description: None,
            base_strategy: base.to_string(),
            parameters: StrategyProfileParameters::default(),
        }
    }

    fn create_test_loader() -> BuiltinStrategyLoader {
        BuiltinStrategyLoader::new(PlannerSettings::default())
    }

    #[test]
    fn test_builtin_strategies_registered() {
        let mut registry = StrategyRegistry::new();
        registry.load_from(&create_test_loader(), None);
        let loaded = registry.freeze().unwrap();

        assert_eq!(
            loaded.names(),
            vec!["naive_scan", "same_dest_stack", "ground_first_move", "run_detach", "reverse_scan"]
        );
        assert!(loaded.problems().is_empty());
        assert_eq!(loaded.get(0).unwrap().create().name(), "naive_scan");
    }

    #[test]
    fn test_profile_overrides_base_definition() {
        let mut profile = create_test_profile("stack_far", "same_dest_stack");
        profile.parameters.destination_order = Some("farthest_first".to_string());
        profile.parameters.spot_rules = Some(vec!["scan_reverse".to_string()]);

        let definition = definition_from_profile(&profile).unwrap();

        assert_eq!(definition.name, "stack_far");
        assert_eq!(definition.order, DestinationOrder::FarthestFirst);
        assert_eq!(definition.spot_rules, vec![SpotRule::ScanReverse]);
        assert_eq!(definition.blockers, BlockerPolicy::Reload, "未覆盖项沿用内置策略");
    }

    #[test]
    fn test_invalid_profile_reported_as_problem() {
        let loader = create_test_loader().with_profiles(vec![
            create_test_profile("bad_base", "no_such_strategy"),
            create_test_profile("naive_scan", "reverse_scan"),
        ]);
        let mut registry = StrategyRegistry::new();
        registry.load_from(&loader, None);
        let loaded = registry.freeze().unwrap();

        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.problems().len(), 2, "非法基础策略与重名策略各记一条");
    }

    #[test]
    fn test_profiles_loaded_from_algorithm_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("far_reload.json"),
            r#"{"strategy_id": "", "base_strategy": "naive_scan",
                "parameters": {"destination_order": "farthest_first"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut registry = StrategyRegistry::new();
        registry.load_from(&create_test_loader(), Some(dir.path()));
        let loaded = registry.freeze().unwrap();

        assert_eq!(loaded.len(), 6);
        assert!(loaded.names().contains(&"far_reload".to_string()), "空 strategy_id 取文件名");
    }

    #[test]
    fn test_enabled_filter_and_empty_registry() {
        let mut registry = StrategyRegistry::new();
        registry.load_from(&create_test_loader(), None);
        registry.retain_enabled(&["reverse_scan".to_string(), "unknown".to_string()]);
        let loaded = registry.freeze().unwrap();
        assert_eq!(loaded.names(), vec!["reverse_scan"]);
        assert_eq!(loaded.problems().len(), 1);

        assert!(matches!(StrategyRegistry::new().freeze(), Err(EngineError::NoStrategies)));
    }
}
