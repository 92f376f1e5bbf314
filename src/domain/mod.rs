// ==========================================
// 集装箱配载仿真系统 - 领域模型层
// ==========================================
// 职责: 定义箱位网格、集装箱、港口、航线、指令等领域实体
// 红线: 不含文件读取逻辑, 不含规划/校验引擎逻辑
// ==========================================

pub mod container;
pub mod diagnostic;
pub mod instruction;
pub mod port;
pub mod route;
pub mod ship_plan;
pub mod types;

// 重导出核心类型
pub use container::{Container, InvalidReason};
pub use diagnostic::{DiagnosticCode, DiagnosticSet, DiagnosticSeverity};
pub use instruction::{Instruction, InstructionParseError};
pub use port::Port;
pub use route::{CargoFile, ManifestRejection, PortCall, Route};
pub use ship_plan::{ShipPlan, Spot, SpotError, SpotIndex};
pub use types::{DestinationOrder, InstructionKind};
