// ==========================================
// 学习成果评估系统 - 会话认证中间件
// ==========================================
// 令牌来源: Authorization 头（原始令牌或 "Bearer <token>"）
// 认证通过后将 Claims 放入请求扩展
// ==========================================

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::error::ApiError;
use crate::app::routes::common::run_blocking;
use crate::app::state::AppState;

/// 要求有效会话
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(extract_token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("No hay token, autorización denegada".to_string())
        })?
        .to_string();

    let user_api = state.user_api.clone();
    let claims = run_blocking(move || user_api.authenticate(&token))
        .await
        .map_err(|e| {
            tracing::warn!(uri = %request.uri(), error = %e, "会话认证失败");
            e
        })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn extract_token(header: &str) -> &str {
    let header = header.trim();
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim()
}
