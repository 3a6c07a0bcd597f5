// ==========================================
// 学习成果评估系统 - 路由公共工具
// ==========================================
// 职责: ApiError → HTTP 响应映射, JSON 请求体解析, 同步 API 调度
// 红线: 同步 API（SQLite / bcrypt）必须经 run_blocking 调用, 不得阻塞 worker 线程
// 红线: 服务端错误详情只写日志, 响应体使用通用消息
// ==========================================

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};

/// 服务端错误的通用消息
pub const SERVER_ERROR_MESSAGE: &str = "Error del servidor";

/// 错误响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,
}

impl ApiError {
    /// HTTP 状态码与错误代码
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Conflict(_) => (StatusCode::BAD_REQUEST, "CONFLICT"),
            ApiError::ImportError(_) => (StatusCode::BAD_REQUEST, "IMPORT_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::DatabaseConnectionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_CONNECTION_ERROR")
            }
            ApiError::DatabaseTransactionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_TRANSACTION_ERROR")
            }
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
            ApiError::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.is_server_error() {
            tracing::error!(code, error = %self, "请求处理失败");
            SERVER_ERROR_MESSAGE.to_string()
        } else {
            tracing::debug!(code, error = %self, "请求被拒绝");
            self.to_string()
        };

        let body = Json(ErrorResponse {
            code: code.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

/// 解析 JSON 请求体, 解析失败映射为 InvalidInput
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))
}

/// 在阻塞线程池中执行同步 API 调用
///
/// # 参数
/// - f: 持有 Arc API 克隆的闭包
///
/// # 返回
/// - 闭包结果; 任务 panic 或被取消映射为 InternalError
pub async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?
}

/// 仅含消息的成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}
