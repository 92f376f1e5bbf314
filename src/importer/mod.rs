// ==========================================
// 集装箱配载仿真系统 - 导入层
// ==========================================
// 职责: 航次目录扫描, 船型/航线/舱单文件读取
// 输出: 领域对象 + 诊断码集合
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod manifest_reader;
pub mod plan_reader;
pub mod route_reader;
pub mod travel_scanner;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvLineParser, LineRecord, LineSource};
pub use manifest_reader::{ManifestReader, PortLoad};
pub use plan_reader::{PlanLoad, ShipPlanReader};
pub use route_reader::{RouteLoad, RouteReader};
pub use travel_scanner::{list_travel_dirs, parse_cargo_file_name, TravelFiles};
