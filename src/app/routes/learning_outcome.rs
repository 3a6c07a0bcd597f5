// ==========================================
// 学习成果评估系统 - 学习成果路由
// ==========================================

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::api::{OutcomeProgramsRequest, OutcomeRequest, OutcomeWithPrograms};
use crate::app::routes::common::{json_body, run_blocking, MessageResponse};
use crate::app::state::AppState;
use crate::domain::learning_outcome::LearningOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeResponse<T> {
    pub message: String,
    pub ra: T,
}

fn with_message<T>(message: &str, ra: T) -> Json<OutcomeResponse<T>> {
    Json(OutcomeResponse {
        message: message.to_string(),
        ra,
    })
}

pub async fn create_outcome(
    State(state): State<AppState>,
    payload: Result<Json<OutcomeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OutcomeResponse<LearningOutcome>>)> {
    let request = json_body(payload)?;
    let outcome_api = state.outcome_api.clone();
    let outcome = run_blocking(move || outcome_api.create_outcome(request)).await?;
    Ok((
        StatusCode::CREATED,
        with_message("Resultado de aprendizaje creado exitosamente", outcome),
    ))
}

pub async fn add_programs(
    State(state): State<AppState>,
    payload: Result<Json<OutcomeProgramsRequest>, JsonRejection>,
) -> ApiResult<Json<OutcomeResponse<OutcomeWithPrograms>>> {
    let request = json_body(payload)?;
    let outcome_api = state.outcome_api.clone();
    let outcome = run_blocking(move || outcome_api.add_programs(request)).await?;
    Ok(with_message("Programas agregados exitosamente", outcome))
}

pub async fn remove_programs(
    State(state): State<AppState>,
    payload: Result<Json<OutcomeProgramsRequest>, JsonRejection>,
) -> ApiResult<Json<OutcomeResponse<OutcomeWithPrograms>>> {
    let request = json_body(payload)?;
    let outcome_api = state.outcome_api.clone();
    let outcome = run_blocking(move || outcome_api.remove_programs(request)).await?;
    Ok(with_message("Programas eliminados exitosamente", outcome))
}

pub async fn list_outcomes(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<LearningOutcome>>> {
    let outcome_api = state.outcome_api.clone();
    Ok(Json(run_blocking(move || outcome_api.list_outcomes()).await?))
}

/// 含项目详情的列表
pub async fn list_outcomes_with_programs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<OutcomeWithPrograms>>> {
    let outcome_api = state.outcome_api.clone();
    Ok(Json(
        run_blocking(move || outcome_api.list_outcomes_with_programs()).await?,
    ))
}

pub async fn get_outcome(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OutcomeWithPrograms>> {
    let outcome_api = state.outcome_api.clone();
    Ok(Json(run_blocking(move || outcome_api.get_outcome(&id)).await?))
}

pub async fn update_outcome(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<OutcomeRequest>, JsonRejection>,
) -> ApiResult<Json<OutcomeResponse<OutcomeWithPrograms>>> {
    let request = json_body(payload)?;
    let outcome_api = state.outcome_api.clone();
    let outcome = run_blocking(move || outcome_api.update_outcome(&id, request)).await?;
    Ok(with_message(
        "Resultado de aprendizaje actualizado exitosamente",
        outcome,
    ))
}

pub async fn delete_outcome(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let outcome_api = state.outcome_api.clone();
    run_blocking(move || outcome_api.delete_outcome(&id)).await?;
    Ok(MessageResponse::new(
        "Resultado de aprendizaje eliminado exitosamente",
    ))
}

pub async fn list_by_program(
    State(state): State<AppState>,
    Path(program_id): Path<String>,
) -> ApiResult<Json<Vec<LearningOutcome>>> {
    let outcome_api = state.outcome_api.clone();
    Ok(Json(
        run_blocking(move || outcome_api.list_by_program(&program_id)).await?,
    ))
}
