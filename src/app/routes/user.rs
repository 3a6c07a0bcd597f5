// ==========================================
// 学习成果评估系统 - 用户路由
// ==========================================
// 公开: register / login / forgot-password
// 其余路由需要有效会话
// ==========================================

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::api::{LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest};
use crate::app::routes::common::{json_body, run_blocking, MessageResponse};
use crate::app::state::AppState;
use crate::domain::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub username: String,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let request = json_body(payload)?;
    let user_api = state.user_api.clone();
    let user = run_blocking(move || user_api.register(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "Usuario registrado exitosamente".to_string(),
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let request = json_body(payload)?;
    let user_api = state.user_api.clone();
    Ok(Json(run_blocking(move || user_api.login(request)).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_api = state.user_api.clone();
    run_blocking(move || user_api.logout(&username)).await?;
    Ok(MessageResponse::new("Sesión cerrada exitosamente"))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let request = json_body(payload)?;
    state.user_api.forgot_password(&request.username).await?;
    Ok(MessageResponse::new(
        "Se ha enviado una nueva contraseña a su correo electrónico",
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let request = json_body(payload)?;
    let user_api = state.user_api.clone();
    let user = run_blocking(move || user_api.update_user(&username, request)).await?;
    Ok(Json(UserResponse {
        message: "Usuario actualizado exitosamente".to_string(),
        user,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_api = state.user_api.clone();
    run_blocking(move || user_api.delete_user(&username)).await?;
    Ok(MessageResponse::new("Usuario eliminado exitosamente"))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let user_api = state.user_api.clone();
    Ok(Json(run_blocking(move || user_api.list_users()).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<User>> {
    let user_api = state.user_api.clone();
    Ok(Json(run_blocking(move || user_api.get_user(&username)).await?))
}
