// ==========================================
// 集装箱配载仿真系统 - 航线文件读取
// ==========================================
// 格式: 每行一个 5 位字母港口代码
// 红线: 文件不可读/为空, 或有效港口少于两个 → 航次无法执行
// ==========================================

use crate::domain::container::{is_valid_port_code, normalize_port_code};
use crate::domain::diagnostic::{DiagnosticCode, DiagnosticSet};
use crate::domain::route::Route;
use crate::importer::file_parser::{CsvLineParser, LineSource};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RouteLoad {
    /// None 表示航次无法执行
    pub route: Option<Route>,
    pub diagnostics: DiagnosticSet,
}

// ==========================================
// RouteReader - 航线读取器
// ==========================================
pub struct RouteReader<S: LineSource = CsvLineParser> {
    source: S,
}

impl RouteReader<CsvLineParser> {
    pub fn new() -> Self {
        Self {
            source: CsvLineParser,
        }
    }
}

impl Default for RouteReader<CsvLineParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LineSource> RouteReader<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// 读取航线文件
    pub fn read(&self, path: &Path) -> RouteLoad {
        let mut diagnostics = DiagnosticSet::new();

        let records = match self.source.read_records(path) {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                warn!(path = %path.display(), "航线文件为空");
                diagnostics.insert(DiagnosticCode::RouteUnreadable);
                return RouteLoad {
                    route: None,
                    diagnostics,
                };
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "航线文件无法读取");
                diagnostics.insert(DiagnosticCode::RouteUnreadable);
                return RouteLoad {
                    route: None,
                    diagnostics,
                };
            }
        };

        let mut ports: Vec<String> = Vec::new();
        for record in &records {
            let token = record.field(0).unwrap_or("");
            if record.fields.len() != 1 || !is_valid_port_code(token) {
                debug!(line = record.line_no, token, "港口代码格式错误, 忽略");
                diagnostics.insert(DiagnosticCode::RouteBadPortCode);
                continue;
            }

            let code = normalize_port_code(token);
            if ports.last() == Some(&code) {
                debug!(line = record.line_no, port = %code, "港口连续重复, 合并");
                diagnostics.insert(DiagnosticCode::RouteConsecutiveRepeat);
                continue;
            }
            ports.push(code);
        }

        if ports.len() < 2 {
            warn!(path = %path.display(), valid_ports = ports.len(), "航线有效港口不足两个");
            diagnostics.insert(DiagnosticCode::RouteSinglePort);
            return RouteLoad {
                route: None,
                diagnostics,
            };
        }

        debug!(ports = ?ports, "航线读取完成");
        RouteLoad {
            route: Some(Route::new(ports)),
            diagnostics,
        }
    }
}
