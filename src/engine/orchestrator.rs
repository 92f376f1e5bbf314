// ==========================================
// 集装箱配载仿真系统 - 仿真编排器
// ==========================================
// 用途: 发现航次与策略, 运行全部 (策略, 航次) 任务, 汇总结果并写出报告
// 流程: 加载阶段 (策略注册 → 冻结) → 航次准备 → 执行 → 汇总 → 写出
// 红线: 工作任务开始前策略集合已冻结、结果矩阵已按全尺寸分配
// 红线: 线程数为 1 时纯同步执行, 不创建运行时
// ==========================================

use crate::config::SimulationConfigReader;
use crate::engine::balance::{approve_all_factory, BalancePolicyFactory};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::planner::PlannerSettings;
use crate::engine::registry::{BuiltinStrategyLoader, LoadedStrategies, StrategyLoader, StrategyRegistry};
use crate::engine::results::{
    write_reports, ErrorReport, RemovedTravel, ReportPaths, ResultMatrix, ResultsTable, RunSummary,
};
use crate::engine::simulation::{prepare_travel, simulate_travel, PreparedTravel, SimulationSettings, TravelSetup};
use crate::importer::list_travel_dirs;
use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

// ==========================================
// RunRequest / RunReport
// ==========================================

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub travel_path: PathBuf,
    pub algorithm_path: Option<PathBuf>,
    pub output_dir: PathBuf,
}

#[derive(Debug)]
pub struct RunReport {
    pub table: ResultsTable,
    pub errors: ErrorReport,
    pub summary: RunSummary,
    pub paths: ReportPaths,
}

/// 航次发现结果
#[derive(Debug, Default)]
pub struct TravelDiscovery {
    pub ready: Vec<PreparedTravel>,
    pub removed: Vec<RemovedTravel>,
}

// ==========================================
// SimulationOrchestrator - 仿真编排器
// ==========================================
pub struct SimulationOrchestrator<C>
where
    C: SimulationConfigReader,
{
    config: Arc<C>,
    balance: BalancePolicyFactory,
    loader: Option<Box<dyn StrategyLoader>>,
}

impl<C> SimulationOrchestrator<C>
where
    C: SimulationConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器
    pub fn new(config: Arc<C>) -> Self {
        Self {
            config,
            balance: approve_all_factory(),
            loader: None,
        }
    }

    /// 替换配重策略工厂
    pub fn with_balance_policy(mut self, factory: BalancePolicyFactory) -> Self {
        self.balance = factory;
        self
    }

    /// 替换策略加载器（默认为内置加载器 + 配置中的自定义策略）
    pub fn with_loader(mut self, loader: Box<dyn StrategyLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            far_ratio: self.config.get_far_destination_ratio(),
            strict_check_digit: self.config.get_strict_check_digit(),
        }
    }

    /// 加载阶段: 注册全部策略并冻结
    ///
    /// # 返回
    /// - Err(NoStrategies): 过滤后没有可运行策略
    pub fn load_strategies(&self, algorithm_path: Option<&Path>) -> EngineResult<LoadedStrategies> {
        let mut registry = StrategyRegistry::new();

        match &self.loader {
            Some(loader) => registry.load_from(loader.as_ref(), algorithm_path),
            None => {
                let profiles = match self.config.get_custom_strategy_profiles() {
                    Ok(profiles) => profiles,
                    Err(e) => {
                        warn!(error = %e, "自定义策略配置无法读取");
                        registry.record_problem(e.to_string());
                        Vec::new()
                    }
                };
                let loader = BuiltinStrategyLoader::new(self.planner_settings()).with_profiles(profiles);
                registry.load_from(&loader, algorithm_path);
            }
        }
        registry.retain_enabled(&self.config.get_enabled_strategies());

        registry.freeze()
    }

    /// 发现并准备全部航次
    pub fn discover_travels(&self, travel_path: &Path) -> EngineResult<TravelDiscovery> {
        let mut discovery = TravelDiscovery::default();
        for dir in list_travel_dirs(travel_path)? {
            match prepare_travel(&dir) {
                TravelSetup::Ready(travel) => discovery.ready.push(travel),
                TravelSetup::Removed { travel, reason } => {
                    discovery.removed.push(RemovedTravel { travel, reason })
                }
            }
        }
        info!(
            ready = discovery.ready.len(),
            removed = discovery.removed.len(),
            "航次发现完成"
        );
        Ok(discovery)
    }

    /// 执行完整仿真并写出报告
    pub fn run(&self, request: &RunRequest) -> EngineResult<RunReport> {
        let started_at = Utc::now();
        let num_threads = self.config.get_num_threads();
        info!(
            travel_path = %request.travel_path.display(),
            output_dir = %request.output_dir.display(),
            num_threads,
            "开始执行仿真"
        );

        // ==========================================
        // 步骤1: 加载阶段
        // ==========================================
        debug!("步骤1: 加载策略");
        let strategies = self.load_strategies(request.algorithm_path.as_deref())?;

        // ==========================================
        // 步骤2: 航次准备
        // ==========================================
        debug!("步骤2: 准备航次");
        let discovery = self.discover_travels(&request.travel_path)?;

        let mut general: Vec<String> = strategies.problems().to_vec();
        general.extend(
            discovery
                .removed
                .iter()
                .map(|r| format!("{}: {}", r.travel, r.reason)),
        );
        for travel in &discovery.ready {
            general.extend(travel.warnings.iter().map(|w| format!("{}: {}", travel.name(), w)));
        }

        // ==========================================
        // 步骤3: 执行
        // ==========================================
        debug!("步骤3: 执行任务");
        let settings = SimulationSettings {
            planner: self.planner_settings(),
            write_instruction_files: self.config.get_write_instruction_files(),
            output_dir: request.output_dir.clone(),
        };
        let travels = Arc::new(discovery.ready);
        let matrix = self.execute(&strategies, &travels, settings, num_threads)?;

        // ==========================================
        // 步骤4: 汇总与写出
        // ==========================================
        debug!("步骤4: 汇总结果");
        let table = ResultsTable::from_matrix(&matrix);
        let errors = ErrorReport::build(general, &matrix);

        let mut summary = RunSummary::new(started_at, num_threads);
        summary.strategies = strategies.names();
        summary.travels = matrix.travels().to_vec();
        summary.removed_travels = discovery.removed;
        summary.total_errors = table.rows.iter().map(|r| r.errors).sum();
        summary.config_snapshot = self.config.get_config_snapshot_json();
        summary.finished_at = Utc::now();

        let paths = write_reports(&request.output_dir, &table, &errors, &summary)?;

        info!(
            run_id = %summary.run_id,
            strategies = summary.strategies.len(),
            travels = summary.travels.len(),
            removed = summary.removed_travels.len(),
            total_errors = summary.total_errors,
            "仿真执行完成"
        );

        Ok(RunReport {
            table,
            errors,
            summary,
            paths,
        })
    }

    /// 运行全部 (策略, 航次) 任务
    ///
    /// # 参数
    /// - num_threads: 1 为同步执行, 否则使用固定大小的工作池
    pub fn execute(
        &self,
        strategies: &LoadedStrategies,
        travels: &Arc<Vec<PreparedTravel>>,
        settings: SimulationSettings,
        num_threads: usize,
    ) -> EngineResult<Arc<ResultMatrix>> {
        let matrix = Arc::new(ResultMatrix::new(
            strategies.names(),
            travels.iter().map(|t| t.name().to_string()).collect(),
        ));

        if num_threads <= 1 {
            for (s, handle) in strategies.iter().enumerate() {
                for (t, travel) in travels.iter().enumerate() {
                    let outcome = simulate_travel(handle, travel, &settings, &self.balance);
                    matrix.fill(s, t, outcome)?;
                }
            }
            return Ok(matrix);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(num_threads)
            .max_blocking_threads(num_threads)
            .thread_name("stowage-worker")
            .enable_all()
            .build()
            .map_err(|e| EngineError::RuntimeBuild(e.to_string()))?;

        let settings = Arc::new(settings);
        runtime.block_on(async {
            let semaphore = Arc::new(Semaphore::new(num_threads));
            let mut tasks = Vec::with_capacity(matrix.strategies().len() * travels.len());

            for (s, handle) in strategies.iter().enumerate() {
                for t in 0..travels.len() {
                    let permit = semaphore
                        .clone()
                        .acquire_owned()
                        .await
                        .map_err(|e| EngineError::WorkerJoin(e.to_string()))?;
                    let handle = handle.clone();
                    let travels = Arc::clone(travels);
                    let settings = Arc::clone(&settings);
                    let balance = Arc::clone(&self.balance);
                    let matrix = Arc::clone(&matrix);

                    tasks.push(tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        let outcome = simulate_travel(&handle, &travels[t], &settings, &balance);
                        matrix.fill(s, t, outcome)
                    }));
                }
            }

            for joined in join_all(tasks).await {
                joined.map_err(|e| EngineError::WorkerJoin(e.to_string()))??;
            }
            Ok::<(), EngineError>(())
        })?;

        debug!(filled = matrix.filled(), "全部任务完成");
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{config_keys, ConfigManager};
    use std::fs;
    use tempfile::TempDir;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn create_test_travel_root() -> TempDir {
        let root = TempDir::new().unwrap();
        let good = root.path().join("travel_good");
        fs::create_dir_all(&good).unwrap();
        fs::write(good.join("s.ship_plan"), "2,1,2\n").unwrap();
        fs::write(good.join("s.route"), "AAAAA\nBBBBB\n").unwrap();
        fs::write(good.join("AAAAA_1.cargo_data"), "AAAU1234567,10,BBBBB\n").unwrap();

        let broken = root.path().join("travel_broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("s.route"), "AAAAA\nBBBBB\n").unwrap();
        root
    }

    fn create_test_orchestrator(threads: &str, enabled: &str) -> SimulationOrchestrator<ConfigManager> {
        let mut config = ConfigManager::new();
        config.set(config_keys::NUM_THREADS, threads);
        config.set(config_keys::ENABLED_STRATEGIES, enabled);
        SimulationOrchestrator::new(Arc::new(config))
    }

    #[test]
    fn test_run_removes_broken_travel() {
        let root = create_test_travel_root();
        let out = TempDir::new().unwrap();
        let orchestrator = create_test_orchestrator("1", "naive_scan,reverse_scan");

        let report = orchestrator
            .run(&RunRequest {
                travel_path: root.path().to_path_buf(),
                algorithm_path: None,
                output_dir: out.path().to_path_buf(),
            })
            .unwrap();

        assert_eq!(report.table.travels, vec!["travel_good"]);
        assert_eq!(report.summary.removed_travels.len(), 1);
        assert_eq!(report.summary.removed_travels[0].travel, "travel_broken");
        assert!(report.errors.render().starts_with("General\ntravel_broken"));
        assert!(report.table.rows.iter().all(|r| r.scores == vec![Some(2)]));
        assert!(report.paths.errors.is_some());
    }

    #[test]
    fn test_pool_matches_sync_execution() {
        let root = create_test_travel_root();
        let out = TempDir::new().unwrap();
        let request = RunRequest {
            travel_path: root.path().to_path_buf(),
            algorithm_path: None,
            output_dir: out.path().to_path_buf(),
        };

        let sync = create_test_orchestrator("1", "").run(&request).unwrap();
        let pooled = create_test_orchestrator("3", "").run(&request).unwrap();

        assert_eq!(sync.table, pooled.table, "工作池与同步执行结果应一致");
        assert_eq!(pooled.summary.num_threads, 3);
    }

    #[test]
    fn test_no_enabled_strategy_is_error() {
        let root = create_test_travel_root();
        let out = TempDir::new().unwrap();
        let result = create_test_orchestrator("1", "does_not_exist").run(&RunRequest {
            travel_path: root.path().to_path_buf(),
            algorithm_path: None,
            output_dir: out.path().to_path_buf(),
        });
        assert!(matches!(result, Err(EngineError::NoStrategies)));
    }
}
