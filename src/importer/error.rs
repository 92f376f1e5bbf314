// ==========================================
// 集装箱配载仿真系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 文件内容层面的数据问题走诊断码 (DiagnosticSet),
//       此处只覆盖文件/目录层面的读取失败
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 航次目录错误 =====
    #[error("航次目录不存在: {0}")]
    TravelDirNotFound(String),

    #[error("航次 {travel} 缺少 .{kind} 文件")]
    MissingTravelFile { travel: String, kind: String },

    #[error("航次 {travel} 包含多个 .{kind} 文件")]
    DuplicateTravelFile { travel: String, kind: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
