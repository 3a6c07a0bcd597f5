// ==========================================
// 学习成果评估系统 - 学术项目路由
// ==========================================

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::api::ProgramRequest;
use crate::app::routes::common::{json_body, run_blocking, MessageResponse};
use crate::app::state::AppState;
use crate::domain::program::Program;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramResponse {
    pub message: String,
    pub program: Program,
}

pub async fn create_program(
    State(state): State<AppState>,
    payload: Result<Json<ProgramRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProgramResponse>)> {
    let request = json_body(payload)?;
    let program_api = state.program_api.clone();
    let program = run_blocking(move || program_api.create_program(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProgramResponse {
            message: "Programa creado exitosamente".to_string(),
            program,
        }),
    ))
}

pub async fn list_programs(State(state): State<AppState>) -> ApiResult<Json<Vec<Program>>> {
    let program_api = state.program_api.clone();
    Ok(Json(run_blocking(move || program_api.list_programs()).await?))
}

pub async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Program>> {
    let program_api = state.program_api.clone();
    Ok(Json(run_blocking(move || program_api.get_program(&id)).await?))
}

pub async fn update_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProgramRequest>, JsonRejection>,
) -> ApiResult<Json<ProgramResponse>> {
    let request = json_body(payload)?;
    let program_api = state.program_api.clone();
    let program = run_blocking(move || program_api.update_program(&id, request)).await?;
    Ok(Json(ProgramResponse {
        message: "Programa actualizado exitosamente".to_string(),
        program,
    }))
}

pub async fn delete_program(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let program_api = state.program_api.clone();
    run_blocking(move || program_api.delete_program(&id)).await?;
    Ok(MessageResponse::new("Programa eliminado exitosamente"))
}
