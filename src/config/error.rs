// ==========================================
// 集装箱配载仿真系统 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    FileReadError(String),

    #[error("配置文件格式错误: {0}")]
    ParseError(String),

    #[error("配置项 {key} 格式错误: {message}")]
    InvalidValue { key: String, message: String },

    #[error("自定义策略 {id} 无效: {message}")]
    InvalidProfile { id: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::FileReadError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
