// ==========================================
// 集装箱配载仿真系统 - 吊装指令
// ==========================================
// 职责: 规划器 → 校验引擎 的指令流及其文本行格式
// 格式: L,id,floor,x,y | U,id,floor,x,y | M,id,f,x,y,f2,x2,y2 | R,id,-1,-1,-1
// ==========================================

use crate::domain::ship_plan::SpotIndex;
use crate::domain::types::InstructionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// Instruction - 吊装指令
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Load { id: String, at: SpotIndex },
    Unload { id: String, at: SpotIndex },
    Move { id: String, from: SpotIndex, to: SpotIndex },
    Reject { id: String },
}

impl Instruction {
    pub fn load(id: &str, at: SpotIndex) -> Self {
        Instruction::Load { id: id.to_string(), at }
    }

    pub fn unload(id: &str, at: SpotIndex) -> Self {
        Instruction::Unload { id: id.to_string(), at }
    }

    pub fn relocate(id: &str, from: SpotIndex, to: SpotIndex) -> Self {
        Instruction::Move {
            id: id.to_string(),
            from,
            to,
        }
    }

    pub fn reject(id: &str) -> Self {
        Instruction::Reject { id: id.to_string() }
    }

    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Load { .. } => InstructionKind::Load,
            Instruction::Unload { .. } => InstructionKind::Unload,
            Instruction::Move { .. } => InstructionKind::Move,
            Instruction::Reject { .. } => InstructionKind::Reject,
        }
    }

    pub fn container_id(&self) -> &str {
        match self {
            Instruction::Load { id, .. }
            | Instruction::Unload { id, .. }
            | Instruction::Move { id, .. }
            | Instruction::Reject { id } => id,
        }
    }

    /// 是否计入吊装操作数（拒装不计）
    pub fn counts_as_operation(&self) -> bool {
        !matches!(self, Instruction::Reject { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Load { id, at } | Instruction::Unload { id, at } => write!(
                f,
                "{},{},{},{},{}",
                self.kind(),
                id,
                at.floor,
                at.x,
                at.y
            ),
            Instruction::Move { id, from, to } => write!(
                f,
                "M,{},{},{},{},{},{},{}",
                id, from.floor, from.x, from.y, to.floor, to.x, to.y
            ),
            Instruction::Reject { id } => write!(f, "R,{},-1,-1,-1", id),
        }
    }
}

// ==========================================
// 指令行解析错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionParseError {
    #[error("未知指令类型: {0}")]
    UnknownKind(String),

    #[error("指令字段数错误 ({kind}): 期望 {expected}, 实际 {actual}")]
    FieldCount {
        kind: InstructionKind,
        expected: usize,
        actual: usize,
    },

    #[error("指令箱号为空")]
    MissingId,

    #[error("指令位置非法: {0}")]
    BadPosition(String),
}

fn parse_position(token: &str) -> Result<usize, InstructionParseError> {
    token
        .parse::<usize>()
        .map_err(|_| InstructionParseError::BadPosition(token.to_string()))
}

fn parse_spot(tokens: &[&str]) -> Result<SpotIndex, InstructionParseError> {
    Ok(SpotIndex::new(
        parse_position(tokens[0])?,
        parse_position(tokens[1])?,
        parse_position(tokens[2])?,
    ))
}

impl FromStr for Instruction {
    type Err = InstructionParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split(',').map(|t| t.trim()).collect();
        let kind = InstructionKind::from_code(tokens[0])
            .ok_or_else(|| InstructionParseError::UnknownKind(tokens[0].to_string()))?;

        if tokens.len() != kind.field_count() {
            return Err(InstructionParseError::FieldCount {
                kind,
                expected: kind.field_count(),
                actual: tokens.len(),
            });
        }

        let id = tokens[1];
        if id.is_empty() {
            return Err(InstructionParseError::MissingId);
        }

        match kind {
            InstructionKind::Load => Ok(Instruction::load(id, parse_spot(&tokens[2..5])?)),
            InstructionKind::Unload => Ok(Instruction::unload(id, parse_spot(&tokens[2..5])?)),
            InstructionKind::Move => Ok(Instruction::relocate(
                id,
                parse_spot(&tokens[2..5])?,
                parse_spot(&tokens[5..8])?,
            )),
            // 拒装指令的位置字段不参与校验
            InstructionKind::Reject => Ok(Instruction::reject(id)),
        }
    }
}
