// ==========================================
// 集装箱配载仿真系统 - 输入诊断码
// ==========================================
// 职责: 船型/航线/舱单文件的数据问题分类
// 红线: 数据问题不是 Rust 错误, 只记录诊断码, 不中断流程
//       (中止航次的诊断码除外)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

// ==========================================
// 诊断严重度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    IgnoreLine,      // 忽略该行
    RejectContainer, // 拒装该箱
    AbortTravel,     // 航次无法执行
}

// ==========================================
// 诊断码 (编号 0~18, 9 保留)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    PlanFloorsNotBlocked,
    PlanPositionOutOfRange,
    PlanBadLineOrSameDuplicate,
    PlanUnreadable,
    PlanConflictingDuplicate,
    RouteConsecutiveRepeat,
    RouteBadPortCode,
    RouteUnreadable,
    RouteSinglePort,
    ManifestDuplicateOnPort,
    ManifestAlreadyAboard,
    ManifestBadWeight,
    ManifestBadDestination,
    ManifestUnreadableId,
    ManifestIllegalId,
    ManifestUnreadable,
    ManifestLastPortHasCargo,
    ManifestExceedsCapacity,
}

impl DiagnosticCode {
    pub const ALL: [DiagnosticCode; 18] = [
        DiagnosticCode::PlanFloorsNotBlocked,
        DiagnosticCode::PlanPositionOutOfRange,
        DiagnosticCode::PlanBadLineOrSameDuplicate,
        DiagnosticCode::PlanUnreadable,
        DiagnosticCode::PlanConflictingDuplicate,
        DiagnosticCode::RouteConsecutiveRepeat,
        DiagnosticCode::RouteBadPortCode,
        DiagnosticCode::RouteUnreadable,
        DiagnosticCode::RouteSinglePort,
        DiagnosticCode::ManifestDuplicateOnPort,
        DiagnosticCode::ManifestAlreadyAboard,
        DiagnosticCode::ManifestBadWeight,
        DiagnosticCode::ManifestBadDestination,
        DiagnosticCode::ManifestUnreadableId,
        DiagnosticCode::ManifestIllegalId,
        DiagnosticCode::ManifestUnreadable,
        DiagnosticCode::ManifestLastPortHasCargo,
        DiagnosticCode::ManifestExceedsCapacity,
    ];

    /// 诊断码编号（即位图中的位序号）
    pub fn code(&self) -> u8 {
        match self {
            DiagnosticCode::PlanFloorsNotBlocked => 0,
            DiagnosticCode::PlanPositionOutOfRange => 1,
            DiagnosticCode::PlanBadLineOrSameDuplicate => 2,
            DiagnosticCode::PlanUnreadable => 3,
            DiagnosticCode::PlanConflictingDuplicate => 4,
            DiagnosticCode::RouteConsecutiveRepeat => 5,
            DiagnosticCode::RouteBadPortCode => 6,
            DiagnosticCode::RouteUnreadable => 7,
            DiagnosticCode::RouteSinglePort => 8,
            DiagnosticCode::ManifestDuplicateOnPort => 10,
            DiagnosticCode::ManifestAlreadyAboard => 11,
            DiagnosticCode::ManifestBadWeight => 12,
            DiagnosticCode::ManifestBadDestination => 13,
            DiagnosticCode::ManifestUnreadableId => 14,
            DiagnosticCode::ManifestIllegalId => 15,
            DiagnosticCode::ManifestUnreadable => 16,
            DiagnosticCode::ManifestLastPortHasCargo => 17,
            DiagnosticCode::ManifestExceedsCapacity => 18,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    pub fn severity(&self) -> DiagnosticSeverity {
        match self {
            DiagnosticCode::PlanUnreadable
            | DiagnosticCode::PlanConflictingDuplicate
            | DiagnosticCode::RouteUnreadable
            | DiagnosticCode::RouteSinglePort => DiagnosticSeverity::AbortTravel,
            DiagnosticCode::ManifestDuplicateOnPort
            | DiagnosticCode::ManifestAlreadyAboard
            | DiagnosticCode::ManifestBadWeight
            | DiagnosticCode::ManifestBadDestination
            | DiagnosticCode::ManifestIllegalId
            | DiagnosticCode::ManifestExceedsCapacity => DiagnosticSeverity::RejectContainer,
            _ => DiagnosticSeverity::IgnoreLine,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == DiagnosticSeverity::AbortTravel
    }

    /// 报告用描述文本
    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticCode::PlanFloorsNotBlocked => "船型: 某位置声明的可用层数不少于总层数 (忽略)",
            DiagnosticCode::PlanPositionOutOfRange => "船型: 位置超出船舶 X/Y 范围 (忽略)",
            DiagnosticCode::PlanBadLineOrSameDuplicate => "船型: 行格式错误或同一 x,y 重复声明且数据一致 (忽略)",
            DiagnosticCode::PlanUnreadable => "船型: 航次错误 - 首行格式错误或文件无法读取 (航次无法执行)",
            DiagnosticCode::PlanConflictingDuplicate => "船型: 航次错误 - 同一 x,y 重复声明且数据冲突 (航次无法执行)",
            DiagnosticCode::RouteConsecutiveRepeat => "航线: 港口连续重复出现 (忽略)",
            DiagnosticCode::RouteBadPortCode => "航线: 港口代码格式错误 (忽略)",
            DiagnosticCode::RouteUnreadable => "航线: 航次错误 - 文件为空或无法读取 (航次无法执行)",
            DiagnosticCode::RouteSinglePort => "航线: 航次错误 - 有效港口不足两个 (航次无法执行)",
            DiagnosticCode::ManifestDuplicateOnPort => "港口舱单: 箱号在本港重复 (拒装)",
            DiagnosticCode::ManifestAlreadyAboard => "港口舱单: 箱号已在船上 (拒装)",
            DiagnosticCode::ManifestBadWeight => "港口舱单: 行格式错误, 重量缺失或非法 (拒装)",
            DiagnosticCode::ManifestBadDestination => "港口舱单: 行格式错误, 目的港缺失或非法 (拒装)",
            DiagnosticCode::ManifestUnreadableId => "港口舱单: 行格式错误, 无法读取箱号 (忽略)",
            DiagnosticCode::ManifestIllegalId => "港口舱单: 箱号未通过 ISO 6346 校验 (拒装)",
            DiagnosticCode::ManifestUnreadable => "港口舱单: 文件无法读取 (视为本港无待装箱)",
            DiagnosticCode::ManifestLastPortHasCargo => "港口舱单: 末港存在待装箱 (忽略)",
            DiagnosticCode::ManifestExceedsCapacity => "港口舱单: 待装箱总数超出船舶容量 (拒装远港箱)",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.description())
    }
}

// ==========================================
// DiagnosticSet - 诊断码位图
// ==========================================
// 第 n 位对应编号 n 的诊断码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DiagnosticSet(u32);

impl DiagnosticSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, code: DiagnosticCode) {
        self.0 |= 1 << code.code();
    }

    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.0 & (1 << code.code()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// 是否包含中止航次的诊断码
    pub fn is_fatal(&self) -> bool {
        self.iter().any(|c| c.is_fatal())
    }

    /// 按编号升序遍历已置位的诊断码（未定义的位被忽略）
    pub fn iter(&self) -> impl Iterator<Item = DiagnosticCode> + '_ {
        DiagnosticCode::ALL
            .iter()
            .copied()
            .filter(move |c| self.contains(*c))
    }
}

impl BitOr for DiagnosticSet {
    type Output = DiagnosticSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        DiagnosticSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for DiagnosticSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<DiagnosticCode> for DiagnosticSet {
    fn from(code: DiagnosticCode) -> Self {
        let mut set = DiagnosticSet::new();
        set.insert(code);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_skip_reserved() {
        let mut seen = std::collections::HashSet::new();
        for code in DiagnosticCode::ALL {
            assert!(seen.insert(code.code()), "诊断码编号重复: {}", code.code());
            assert_ne!(code.code(), 9, "编号 9 为保留位");
            assert_eq!(DiagnosticCode::from_code(code.code()), Some(code));
        }
        assert_eq!(DiagnosticCode::from_code(9), None);
    }

    #[test]
    fn test_severity_classification() {
        assert!(DiagnosticCode::PlanUnreadable.is_fatal());
        assert!(DiagnosticCode::PlanConflictingDuplicate.is_fatal());
        assert!(DiagnosticCode::RouteSinglePort.is_fatal());
        assert_eq!(
            DiagnosticCode::ManifestBadWeight.severity(),
            DiagnosticSeverity::RejectContainer
        );
        assert_eq!(
            DiagnosticCode::ManifestUnreadableId.severity(),
            DiagnosticSeverity::IgnoreLine
        );
    }

    #[test]
    fn test_diagnostic_set_bits() {
        let mut set = DiagnosticSet::new();
        assert!(set.is_empty());
        set.insert(DiagnosticCode::PlanPositionOutOfRange);
        set.insert(DiagnosticCode::ManifestExceedsCapacity);
        assert_eq!(set.bits(), (1 << 1) | (1 << 18));
        assert!(!set.is_fatal());

        set |= DiagnosticSet::from(DiagnosticCode::RouteUnreadable);
        assert!(set.is_fatal());
        let listed: Vec<u8> = set.iter().map(|c| c.code()).collect();
        assert_eq!(listed, vec![1, 7, 18]);
    }

    #[test]
    fn test_undefined_bits_are_ignored() {
        let set = DiagnosticSet::from_bits((1 << 9) | (1 << 25));
        assert_eq!(set.iter().count(), 0);
    }
}
