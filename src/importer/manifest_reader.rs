// ==========================================
// 集装箱配载仿真系统 - 港口舱单读取
// ==========================================
// 格式: 每行 箱号,重量,目的港
// 时机: 航线游标到达该港挂靠时读取
// 红线: 舱单问题只影响单行或单箱, 绝不中止航次
// ==========================================

use crate::domain::container::{
    is_valid_container_id, is_valid_port_code, normalize_port_code, Container, InvalidReason,
};
use crate::domain::diagnostic::{DiagnosticCode, DiagnosticSet};
use crate::domain::port::Port;
use crate::domain::route::{PortCall, Route};
use crate::domain::ship_plan::ShipPlan;
use crate::importer::file_parser::{CsvLineParser, LineRecord, LineSource};
use tracing::{debug, info, warn};

// ==========================================
// PortLoad - 挂靠读取结果
// ==========================================
#[derive(Debug, Clone)]
pub struct PortLoad {
    pub call: PortCall,
    pub port: Port,
    pub diagnostics: DiagnosticSet,
}

// ==========================================
// ManifestReader - 舱单读取器
// ==========================================
pub struct ManifestReader<S: LineSource = CsvLineParser> {
    source: S,
    strict_check_digit: bool,
}

impl ManifestReader<CsvLineParser> {
    pub fn new(strict_check_digit: bool) -> Self {
        Self {
            source: CsvLineParser,
            strict_check_digit,
        }
    }
}

impl Default for ManifestReader<CsvLineParser> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<S: LineSource> ManifestReader<S> {
    pub fn with_source(source: S, strict_check_digit: bool) -> Self {
        Self {
            source,
            strict_check_digit,
        }
    }

    /// 推进航线并读取新港口的舱单
    ///
    /// # 返回
    /// - None: 航线已结束
    pub fn advance(&self, route: &mut Route, ship: &ShipPlan) -> Option<PortLoad> {
        let call = route.advance_to_next_port()?;
        Some(self.read_port(call, ship))
    }

    /// 读取一次挂靠的舱单
    ///
    /// # 参数
    /// - call: 挂靠信息（含舱单路径）
    /// - ship: 当前船舶状态（用于判定箱号已在船上）
    pub fn read_port(&self, call: PortCall, ship: &ShipPlan) -> PortLoad {
        let mut diagnostics = DiagnosticSet::new();
        let mut port = Port::new(&call.code, call.visit);

        let path = match &call.manifest {
            Some(path) => path.clone(),
            None => {
                info!(port = %call.code, visit = call.visit, "本次挂靠无舱单文件, 视为无待装箱");
                return PortLoad {
                    call,
                    port,
                    diagnostics,
                };
            }
        };

        let records = match self.source.read_records(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!(port = %call.code, visit = call.visit, error = %e, "舱单文件无法读取, 视为无待装箱");
                diagnostics.insert(DiagnosticCode::ManifestUnreadable);
                return PortLoad {
                    call,
                    port,
                    diagnostics,
                };
            }
        };

        if call.is_last {
            if !records.is_empty() {
                warn!(port = %call.code, records = records.len(), "末港舱单含待装箱, 忽略");
                diagnostics.insert(DiagnosticCode::ManifestLastPortHasCargo);
            }
            return PortLoad {
                call,
                port,
                diagnostics,
            };
        }

        for record in &records {
            if let Some(container) = self.parse_container(record, &mut diagnostics) {
                let id = container.id.clone();
                if !port.add_waiting(container) {
                    debug!(port = %call.code, container_id = %id, "舱单重复箱号");
                    diagnostics.insert(DiagnosticCode::ManifestDuplicateOnPort);
                }
            }
        }

        let aboard = port.invalidate_aboard(ship);
        if aboard > 0 {
            debug!(port = %call.code, count = aboard, "待装箱号已在船上");
            diagnostics.insert(DiagnosticCode::ManifestAlreadyAboard);
        }

        debug!(
            port = %call.code,
            visit = call.visit,
            waiting = port.waiting_containers().len(),
            duplicates = port.total_duplicates(),
            "舱单读取完成"
        );

        PortLoad {
            call,
            port,
            diagnostics,
        }
    }

    // 单行 → 集装箱; 箱号缺失的行直接丢弃
    fn parse_container(
        &self,
        record: &LineRecord,
        diagnostics: &mut DiagnosticSet,
    ) -> Option<Container> {
        let id = record.field(0).unwrap_or("").to_ascii_uppercase();
        if id.is_empty() {
            diagnostics.insert(DiagnosticCode::ManifestUnreadableId);
            return None;
        }

        let mut reasons: Vec<InvalidReason> = Vec::new();

        if !is_valid_container_id(&id, self.strict_check_digit) {
            diagnostics.insert(DiagnosticCode::ManifestIllegalId);
            reasons.push(InvalidReason::IllegalId);
        }

        let weight = record.field(1).and_then(parse_weight);
        if weight.is_none() {
            diagnostics.insert(DiagnosticCode::ManifestBadWeight);
            reasons.push(InvalidReason::BadWeight);
        }

        let raw_destination = record.field(2).unwrap_or("");
        let destination = normalize_port_code(raw_destination);
        if !is_valid_port_code(raw_destination) {
            diagnostics.insert(DiagnosticCode::ManifestBadDestination);
            reasons.push(InvalidReason::BadDestination);
        }

        if let (None, Some(w)) = (reasons.first(), weight) {
            return Some(Container::new(&id, w, &destination));
        }

        let reason = reasons.first().copied().unwrap_or(InvalidReason::BadWeight);
        debug!(line = record.line_no, container_id = %id, reason = %reason, "舱单箱无效");
        Some(Container::invalid(&id, weight, &destination, reason))
    }
}

// 正整数重量（仅数字）
fn parse_weight(token: &str) -> Option<u32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse::<u32>().ok().filter(|w| *w > 0)
}
