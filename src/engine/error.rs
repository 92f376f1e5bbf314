// ==========================================
// 集装箱配载仿真系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 航次内的数据问题与指令违规不是错误,
//       此处只覆盖编排失败（运行时、工作线程、结果输出）
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 输入相关错误 =====
    #[error("导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("没有可运行的策略")]
    NoStrategies,

    #[error("策略名重复: {0}")]
    DuplicateStrategy(String),

    // ===== 运行相关错误 =====
    #[error("线程池创建失败: {0}")]
    RuntimeBuild(String),

    #[error("工作任务异常退出: {0}")]
    WorkerJoin(String),

    // ===== 输出相关错误 =====
    #[error("结果写出失败: {0}")]
    OutputWrite(String),

    #[error("CSV 写出失败: {0}")]
    CsvWrite(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::OutputWrite(err.to_string())
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::CsvWrite(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::OutputWrite(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
