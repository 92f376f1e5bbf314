// ==========================================
// 集装箱配载仿真系统 - 船型文件读取
// ==========================================
// 格式: 首行 decks,rows,cols; 其余行 x,y,可用层数
// 红线: 首行错误/文件不可读/同列冲突声明 → 航次无法执行
// ==========================================

use crate::domain::diagnostic::{DiagnosticCode, DiagnosticSet};
use crate::domain::ship_plan::ShipPlan;
use crate::importer::file_parser::{CsvLineParser, LineRecord, LineSource};
use std::path::Path;
use tracing::{debug, warn};

/// 单船箱位总数上限（层数 × 行数 × 列数）
pub const MAX_SHIP_SPOTS: usize = 1_000_000;

// ==========================================
// PlanLoad - 船型读取结果
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanLoad {
    /// None 表示航次无法执行
    pub plan: Option<ShipPlan>,
    pub diagnostics: DiagnosticSet,
}

// ==========================================
// ShipPlanReader - 船型读取器
// ==========================================
pub struct ShipPlanReader<S: LineSource = CsvLineParser> {
    source: S,
}

impl ShipPlanReader<CsvLineParser> {
    pub fn new() -> Self {
        Self {
            source: CsvLineParser,
        }
    }
}

impl Default for ShipPlanReader<CsvLineParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LineSource> ShipPlanReader<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// 读取船型文件
    ///
    /// # 参数
    /// - path: .ship_plan 文件路径
    ///
    /// # 返回
    /// PlanLoad（plan 为 None 时 diagnostics 必含中止类诊断码）
    pub fn read(&self, path: &Path) -> PlanLoad {
        let mut diagnostics = DiagnosticSet::new();

        let records = match self.source.read_records(path) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "船型文件无法读取");
                diagnostics.insert(DiagnosticCode::PlanUnreadable);
                return PlanLoad {
                    plan: None,
                    diagnostics,
                };
            }
        };

        // 首行: 层数、行数、列数
        let dimensions = records.first().and_then(parse_dimensions);
        let (decks, rows, cols) = match dimensions {
            Some(d) => d,
            None => {
                warn!(path = %path.display(), "船型文件首行格式错误");
                diagnostics.insert(DiagnosticCode::PlanUnreadable);
                return PlanLoad {
                    plan: None,
                    diagnostics,
                };
            }
        };

        let mut plan = ShipPlan::new(decks, rows, cols);

        for record in records.iter().skip(1) {
            let (x, y, available) = match parse_position_line(record) {
                Some(v) => v,
                None => {
                    debug!(line = record.line_no, "船型行格式错误, 忽略");
                    diagnostics.insert(DiagnosticCode::PlanBadLineOrSameDuplicate);
                    continue;
                }
            };

            if !plan.spot_in_range(x, y) {
                debug!(line = record.line_no, x, y, "船型位置超出范围, 忽略");
                diagnostics.insert(DiagnosticCode::PlanPositionOutOfRange);
                continue;
            }

            if available >= decks {
                diagnostics.insert(DiagnosticCode::PlanFloorsNotBlocked);
                continue;
            }

            let unavailable = decks - available;
            let declared = plan.get_unavailable_floors_num(x, y);
            if declared > 0 {
                if declared == unavailable {
                    diagnostics.insert(DiagnosticCode::PlanBadLineOrSameDuplicate);
                    continue;
                }
                warn!(
                    line = record.line_no,
                    x,
                    y,
                    declared,
                    conflicting = unavailable,
                    "船型同一位置冲突声明"
                );
                diagnostics.insert(DiagnosticCode::PlanConflictingDuplicate);
                return PlanLoad {
                    plan: None,
                    diagnostics,
                };
            }

            if let Err(e) = plan.block_floors(x, y, unavailable) {
                debug!(line = record.line_no, error = %e, "船型声明无法应用, 忽略");
                diagnostics.insert(DiagnosticCode::PlanBadLineOrSameDuplicate);
            }
        }

        debug!(
            decks,
            rows,
            cols,
            free_spots = plan.free_spots(),
            "船型读取完成"
        );

        PlanLoad {
            plan: Some(plan),
            diagnostics,
        }
    }
}

// 首行三个正整数
fn parse_dimensions(record: &LineRecord) -> Option<(usize, usize, usize)> {
    if record.fields.len() != 3 {
        return None;
    }
    let values: Vec<usize> = record
        .fields
        .iter()
        .map(|f| parse_non_negative(f))
        .collect::<Option<Vec<_>>>()?;
    if values.iter().any(|v| *v == 0) {
        return None;
    }
    // 箱位总数溢出或超过上限同样视为首行错误
    let spots = values[0].checked_mul(values[1])?.checked_mul(values[2])?;
    if spots > MAX_SHIP_SPOTS {
        return None;
    }
    Some((values[0], values[1], values[2]))
}

fn parse_position_line(record: &LineRecord) -> Option<(usize, usize, usize)> {
    if record.fields.len() != 3 {
        return None;
    }
    Some((
        parse_non_negative(&record.fields[0])?,
        parse_non_negative(&record.fields[1])?,
        parse_non_negative(&record.fields[2])?,
    ))
}

// 仅接受纯数字
fn parse_non_negative(token: &str) -> Option<usize> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
