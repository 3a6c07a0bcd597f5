// ==========================================
// 学习成果评估系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 引擎错误在任何修改发生前返回
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Datos inválidos: {0}")]
    Validation(String),

    #[error("{entity} no encontrado (id={id})")]
    NotFound { entity: String, id: String },
}

impl EngineError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
