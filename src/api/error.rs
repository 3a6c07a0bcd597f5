// ==========================================
// 学习成果评估系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户可读的错误消息
// 红线: 校验/未找到错误必须在任何写入之前返回
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    Unauthorized(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("Error al importar el archivo: {0}")]
    ImportError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为服务端错误（详情只记日志, 不返回给客户端）
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ApiError::DatabaseError(_)
                | ApiError::DatabaseConnectionError(_)
                | ApiError::DatabaseTransactionError(_)
                | ApiError::InternalError(_)
                | ApiError::Other(_)
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} no encontrado (id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                tracing::warn!("唯一约束违反: {}", msg);
                ApiError::Conflict("El registro ya existe".to_string())
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                tracing::warn!("外键约束违反: {}", msg);
                ApiError::ValidationError("Referencia a un registro inexistente".to_string())
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::NotFound { entity, .. } => {
                ApiError::NotFound(format!("{} no encontrado", entity))
            }
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
