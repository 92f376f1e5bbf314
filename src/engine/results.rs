// ==========================================
// 集装箱配载仿真系统 - 结果汇总与报告
// ==========================================
// 职责: 预分配的结果矩阵 (策略 × 航次), 结果表排序, 报告文件写出
// 红线: 矩阵在工作任务开始前按全尺寸分配, 每个格子只写一次
// 输出:
// - simulation.results: CSV, 行按 (错误数, 总操作数) 升序
// - simulation.errors:  General 段 + 每策略一段
// - run_summary.json:   运行元数据
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::simulation::TravelOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};
use uuid::Uuid;

pub const RESULTS_FILE: &str = "simulation.results";
pub const ERRORS_FILE: &str = "simulation.errors";
pub const SUMMARY_FILE: &str = "run_summary.json";

// ==========================================
// ResultMatrix - 写一次的结果矩阵
// ==========================================
#[derive(Debug)]
pub struct ResultMatrix {
    strategies: Vec<String>,
    travels: Vec<String>,
    cells: Vec<OnceLock<TravelOutcome>>,
}

impl ResultMatrix {
    /// 按全尺寸预分配
    pub fn new(strategies: Vec<String>, travels: Vec<String>) -> Self {
        let cells = (0..strategies.len() * travels.len())
            .map(|_| OnceLock::new())
            .collect();
        Self {
            strategies,
            travels,
            cells,
        }
    }

    pub fn strategies(&self) -> &[String] {
        &self.strategies
    }

    pub fn travels(&self) -> &[String] {
        &self.travels
    }

    fn index(&self, strategy: usize, travel: usize) -> Option<usize> {
        (strategy < self.strategies.len() && travel < self.travels.len())
            .then(|| strategy * self.travels.len() + travel)
    }

    /// 写入一个格子
    ///
    /// # 返回
    /// - Err: 下标越界或该格子已写入
    pub fn fill(&self, strategy: usize, travel: usize, outcome: TravelOutcome) -> EngineResult<()> {
        let index = self.index(strategy, travel).ok_or_else(|| {
            EngineError::Other(anyhow::anyhow!("结果格子越界: ({}, {})", strategy, travel))
        })?;
        self.cells[index].set(outcome).map_err(|outcome| {
            EngineError::Other(anyhow::anyhow!(
                "结果格子重复写入: {} / {}",
                outcome.strategy,
                outcome.travel
            ))
        })
    }

    pub fn get(&self, strategy: usize, travel: usize) -> Option<&TravelOutcome> {
        self.index(strategy, travel).and_then(|i| self.cells[i].get())
    }

    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.get().is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == self.cells.len()
    }

    /// 某策略的全部结果（按航次顺序）
    pub fn row(&self, strategy: usize) -> impl Iterator<Item = Option<&TravelOutcome>> + '_ {
        (0..self.travels.len()).map(move |t| self.get(strategy, t))
    }
}

// ==========================================
// ResultsTable - 排序后的结果表
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub strategy: String,

    /// 各航次得分, -1 表示出错, None 表示未运行
    pub scores: Vec<Option<i64>>,

    /// 不含出错航次的操作数之和
    pub sum: i64,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    pub travels: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultsTable {
    pub fn from_matrix(matrix: &ResultMatrix) -> Self {
        let mut rows: Vec<ResultRow> = matrix
            .strategies()
            .iter()
            .enumerate()
            .map(|(s, name)| {
                let scores: Vec<Option<i64>> = matrix.row(s).map(|o| o.map(|o| o.score())).collect();
                let sum = scores.iter().flatten().filter(|v| **v >= 0).sum();
                let errors = scores.iter().flatten().filter(|v| **v < 0).count();
                ResultRow {
                    strategy: name.clone(),
                    scores,
                    sum,
                    errors,
                }
            })
            .collect();

        // 稳定排序, 同分保持注册顺序
        rows.sort_by(|a, b| (a.errors, a.sum).cmp(&(b.errors, b.sum)));

        Self {
            travels: matrix.travels().to_vec(),
            rows,
        }
    }

    /// 写出 CSV: RESULTS,<travel...>,Sum,Num Errors
    pub fn write_csv(&self, path: &Path) -> EngineResult<()> {
        let mut writer = csv::WriterBuilder::new().flexible(false).from_path(path)?;

        let mut header: Vec<String> = vec!["RESULTS".to_string()];
        header.extend(self.travels.iter().cloned());
        header.push("Sum".to_string());
        header.push("Num Errors".to_string());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record: Vec<String> = vec![row.strategy.clone()];
            record.extend(
                row.scores
                    .iter()
                    .map(|s| s.map(|v| v.to_string()).unwrap_or_default()),
            );
            record.push(row.sum.to_string());
            record.push(row.errors.to_string());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = self.rows.len(), "结果表写出完成");
        Ok(())
    }
}

// ==========================================
// ErrorReport - 错误报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorReport {
    /// 航次级 / 加载阶段问题
    pub general: Vec<String>,

    /// (策略名, 该策略的问题行)
    pub sections: Vec<(String, Vec<String>)>,
}

impl ErrorReport {
    /// 按策略 → 航次分组整理校验问题与规划器自报诊断
    pub fn build(general: Vec<String>, matrix: &ResultMatrix) -> Self {
        let sections = matrix
            .strategies()
            .iter()
            .enumerate()
            .map(|(s, name)| {
                let mut lines = Vec::new();
                for outcome in matrix.row(s).flatten() {
                    lines.extend(
                        outcome
                            .issues
                            .iter()
                            .map(|issue| format!("{}: {}", outcome.travel, issue)),
                    );
                    lines.extend(outcome.reported.iter().map(|code| {
                        format!("@ Algorithm reported in travel {}: {}", outcome.travel, code)
                    }));
                    lines.extend(
                        outcome
                            .output_problems
                            .iter()
                            .map(|p| format!("{}: {}", outcome.travel, p)),
                    );
                }
                (name.clone(), lines)
            })
            .collect();
        Self { general, sections }
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_empty() && self.sections.iter().all(|(_, lines)| lines.is_empty())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.general.is_empty() {
            out.push_str("General\n");
            for line in &self.general {
                out.push_str(line);
                out.push('\n');
            }
        }
        for (strategy, lines) in &self.sections {
            if lines.is_empty() {
                continue;
            }
            out.push_str(strategy);
            out.push('\n');
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

// ==========================================
// RunSummary - 运行元数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedTravel {
    pub travel: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub num_threads: usize,
    pub strategies: Vec<String>,
    pub travels: Vec<String>,
    pub removed_travels: Vec<RemovedTravel>,
    pub total_errors: usize,

    #[serde(default)]
    pub config_snapshot: Option<serde_json::Value>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, num_threads: usize) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at,
            finished_at: started_at,
            num_threads,
            strategies: Vec::new(),
            travels: Vec::new(),
            removed_travels: Vec::new(),
            total_errors: 0,
            config_snapshot: None,
        }
    }
}

// ==========================================
// 报告写出
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub results: PathBuf,

    /// None 表示没有任何问题, 未写出错误报告
    pub errors: Option<PathBuf>,
    pub summary: PathBuf,
}

pub fn write_reports(
    output_dir: &Path,
    table: &ResultsTable,
    errors: &ErrorReport,
    summary: &RunSummary,
) -> EngineResult<ReportPaths> {
    fs::create_dir_all(output_dir)?;

    let results = output_dir.join(RESULTS_FILE);
    table.write_csv(&results)?;

    let errors_path = output_dir.join(ERRORS_FILE);
    let errors_written = if errors.is_empty() {
        if errors_path.exists() {
            fs::remove_file(&errors_path)?;
        }
        None
    } else {
        fs::write(&errors_path, errors.render())?;
        Some(errors_path)
    };

    let summary_path = output_dir.join(SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(summary)?)?;

    info!(
        output_dir = %output_dir.display(),
        run_id = %summary.run_id,
        has_errors = errors_written.is_some(),
        "报告写出完成"
    );

    Ok(ReportPaths {
        results,
        errors: errors_written,
        summary: summary_path,
    })
}
