// ==========================================
// 集装箱配载仿真系统 - 命令行入口
// ==========================================
// 用法:
//   ship-stowage -travel_path <dir> [-algorithm_path <dir>] [-output <dir>]
//                [-num_threads <n>] [-config <file.json>]
// 命令行参数优先于配置文件
// ==========================================

use anyhow::{anyhow, bail, Context};
use ship_stowage::config::{config_keys, ConfigManager};
use ship_stowage::engine::{RunRequest, SimulationOrchestrator};
use ship_stowage::{logging, perf, APP_NAME, VERSION};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Default)]
struct CliArgs {
    travel_path: Option<PathBuf>,
    algorithm_path: Option<PathBuf>,
    output: Option<PathBuf>,
    num_threads: Option<String>,
    config: Option<PathBuf>,
}

fn parse_args<I>(args: I) -> anyhow::Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .filter(|v| !v.starts_with('-'))
                .ok_or_else(|| anyhow!("参数 {} 缺少取值", flag))
        };
        match flag.as_str() {
            "-travel_path" => parsed.travel_path = Some(PathBuf::from(value()?)),
            "-algorithm_path" => parsed.algorithm_path = Some(PathBuf::from(value()?)),
            "-output" => parsed.output = Some(PathBuf::from(value()?)),
            "-num_threads" => parsed.num_threads = Some(value()?),
            "-config" => parsed.config = Some(PathBuf::from(value()?)),
            other => bail!("未知参数: {}", other),
        }
    }
    Ok(parsed)
}

fn main() -> anyhow::Result<()> {
    logging::init();
    perf::install_from_env();

    tracing::info!("==================================================");
    tracing::info!("{}", APP_NAME);
    tracing::info!("系统版本: {}", VERSION);
    tracing::info!("==================================================");

    let args = parse_args(std::env::args().skip(1))?;
    let travel_path = args
        .travel_path
        .ok_or_else(|| anyhow!("缺少必填参数 -travel_path <dir>"))?;

    // 配置文件 + 命令行覆写
    let mut config = match &args.config {
        Some(path) => ConfigManager::from_file(path)
            .with_context(|| format!("配置文件加载失败: {}", path.display()))?,
        None => ConfigManager::new(),
    };
    if let Some(threads) = &args.num_threads {
        config.set(config_keys::NUM_THREADS, threads);
    }

    let request = RunRequest {
        travel_path,
        algorithm_path: args.algorithm_path,
        output_dir: args.output.unwrap_or_else(|| PathBuf::from(".")),
    };

    let orchestrator = SimulationOrchestrator::new(Arc::new(config));
    let report = orchestrator.run(&request).context("仿真执行失败")?;

    tracing::info!(
        results = %report.paths.results.display(),
        errors = ?report.paths.errors,
        total_errors = report.summary.total_errors,
        "报告已写出"
    );
    Ok(())
}
