// ==========================================
// 集装箱配载仿真系统 - 集装箱实体
// ==========================================
// 职责: 集装箱基础属性与箱号/港口代码格式校验
// 红线: 集装箱不拥有箱位, 只记录箱位索引 (由 ShipPlan 维护)
// ==========================================

use crate::domain::ship_plan::SpotIndex;
use crate::domain::types::PORT_CODE_LEN;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 无效原因 (Invalid Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    IllegalId,      // 箱号格式非法
    BadWeight,      // 重量缺失或非法
    BadDestination, // 目的港缺失或格式非法
    AlreadyAboard,  // 同箱号已在船上
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::IllegalId => write!(f, "箱号格式非法"),
            InvalidReason::BadWeight => write!(f, "重量缺失或非法"),
            InvalidReason::BadDestination => write!(f, "目的港缺失或非法"),
            InvalidReason::AlreadyAboard => write!(f, "箱号已在船上"),
        }
    }
}

// ==========================================
// Container - 集装箱
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// 箱号
    pub id: String,

    /// 重量（None 表示舱单中缺失或非法）
    pub weight: Option<u32>,

    /// 目的港代码
    pub destination: String,

    /// 当前箱位（None 表示不在船上）
    spot: Option<SpotIndex>,

    /// 无效原因（None 表示有效）
    invalid_reason: Option<InvalidReason>,
}

impl Container {
    /// 创建有效集装箱
    pub fn new(id: &str, weight: u32, destination: &str) -> Self {
        Self {
            id: id.to_string(),
            weight: Some(weight),
            destination: destination.to_string(),
            spot: None,
            invalid_reason: None,
        }
    }

    /// 创建舱单读取阶段判定为无效的集装箱
    pub fn invalid(id: &str, weight: Option<u32>, destination: &str, reason: InvalidReason) -> Self {
        Self {
            id: id.to_string(),
            weight,
            destination: destination.to_string(),
            spot: None,
            invalid_reason: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_reason.is_none()
    }

    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        self.invalid_reason
    }

    /// 标记为无效（已有原因时保留首个原因）
    pub fn invalidate(&mut self, reason: InvalidReason) {
        if self.invalid_reason.is_none() {
            self.invalid_reason = Some(reason);
        }
    }

    /// 配重计算用重量（无效箱按 0 计）
    pub fn weight_or_zero(&self) -> u32 {
        self.weight.unwrap_or(0)
    }

    pub fn spot(&self) -> Option<SpotIndex> {
        self.spot
    }

    pub fn is_placed(&self) -> bool {
        self.spot.is_some()
    }

    pub(crate) fn set_spot(&mut self, spot: Option<SpotIndex>) {
        self.spot = spot;
    }
}

// ==========================================
// 箱号校验 (ISO 6346)
// ==========================================

/// 箱号格式: 3 位箱主代码 + 1 位类别 (J/U/Z) + 6 位序号 + 1 位校验码
pub fn is_valid_id_format(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != 11 {
        return false;
    }
    bytes[..3].iter().all(|b| b.is_ascii_uppercase())
        && matches!(bytes[3], b'J' | b'U' | b'Z')
        && bytes[4..].iter().all(|b| b.is_ascii_digit())
}

/// 计算 ISO 6346 校验码
///
/// # 返回
/// - Some(digit): 前 10 位格式合法时的校验码
/// - None: 格式非法
pub fn iso6346_check_digit(id: &str) -> Option<u32> {
    if !is_valid_id_format(id) {
        return None;
    }

    let mut sum: u32 = 0;
    for (i, ch) in id.chars().take(10).enumerate() {
        let value = if ch.is_ascii_digit() {
            ch.to_digit(10)?
        } else {
            letter_value(ch)?
        };
        sum += value << i;
    }
    Some(sum % 11 % 10)
}

// 字母取值从 10 开始, 跳过 11 的倍数
fn letter_value(ch: char) -> Option<u32> {
    if !ch.is_ascii_uppercase() {
        return None;
    }
    let mut value = 10;
    for c in 'A'..=ch {
        if value % 11 == 0 {
            value += 1;
        }
        if c == ch {
            return Some(value);
        }
        value += 1;
    }
    None
}

/// 箱号校验
///
/// # 参数
/// - id: 箱号
/// - strict_check_digit: 是否额外校验第 11 位校验码
pub fn is_valid_container_id(id: &str, strict_check_digit: bool) -> bool {
    if !is_valid_id_format(id) {
        return false;
    }
    if !strict_check_digit {
        return true;
    }
    let declared = id[10..].chars().next().and_then(|c| c.to_digit(10));
    declared.is_some() && declared == iso6346_check_digit(id)
}

// ==========================================
// 港口代码校验
// ==========================================

/// 港口代码: 5 位字母（大小写均可, 统一转大写）
pub fn is_valid_port_code(code: &str) -> bool {
    code.len() == PORT_CODE_LEN && code.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn normalize_port_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
