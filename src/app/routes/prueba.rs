// ==========================================
// 学习成果评估系统 - 测评路由
// ==========================================
// 职责: 测评 CRUD, 分组查询, 名单导入（multipart）, 学生维护
// 红线: 导入文件字段名固定为 "file"; 全量聚合读写均在阻塞线程池执行
// ==========================================

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::{AssessmentDetail, AssessmentRequest, GroupDetail, StudentDetail};
use crate::app::routes::common::{json_body, run_blocking, MessageResponse};
use crate::app::state::AppState;
use crate::engine::{RosterMergeSummary, StudentPatch};

/// 上传文件的表单字段名
pub const UPLOAD_FIELD: &str = "file";

// ==========================================
// 响应类型
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruebaResponse {
    pub prueba: AssessmentDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruebaMessageResponse {
    pub message: String,
    pub prueba: AssessmentDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group: GroupDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentResponse {
    pub message: String,
    pub student: StudentDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub message: String,
    pub imported: usize,
    pub skipped: usize,
    pub summary: RosterMergeSummary,
    pub prueba: AssessmentDetail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    #[serde(default, alias = "documento")]
    pub document: String,
    #[serde(default, alias = "nombre")]
    pub name: String,
}

fn prueba_message(message: &str, prueba: AssessmentDetail) -> Json<PruebaMessageResponse> {
    Json(PruebaMessageResponse {
        message: message.to_string(),
        prueba,
    })
}

// ==========================================
// 测评 CRUD
// ==========================================

pub async fn create_prueba(
    State(state): State<AppState>,
    payload: Result<Json<AssessmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PruebaMessageResponse>)> {
    let request = json_body(payload)?;
    let prueba_api = state.prueba_api.clone();
    let prueba = run_blocking(move || prueba_api.create_prueba(request)).await?;
    Ok((
        StatusCode::CREATED,
        prueba_message("Prueba creada exitosamente", prueba),
    ))
}

pub async fn list_pruebas(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AssessmentDetail>>> {
    let prueba_api = state.prueba_api.clone();
    Ok(Json(run_blocking(move || prueba_api.list_pruebas()).await?))
}

pub async fn get_prueba(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PruebaResponse>> {
    let prueba_api = state.prueba_api.clone();
    let prueba = run_blocking(move || prueba_api.get_prueba(&id)).await?;
    Ok(Json(PruebaResponse { prueba }))
}

pub async fn edit_prueba(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AssessmentRequest>, JsonRejection>,
) -> ApiResult<Json<PruebaMessageResponse>> {
    let request = json_body(payload)?;
    let prueba_api = state.prueba_api.clone();
    let prueba = run_blocking(move || prueba_api.edit_prueba(&id, request)).await?;
    Ok(prueba_message("Prueba actualizada exitosamente", prueba))
}

pub async fn delete_prueba(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let prueba_api = state.prueba_api.clone();
    run_blocking(move || prueba_api.delete_prueba(&id)).await?;
    Ok(MessageResponse::new("Prueba eliminada exitosamente"))
}

// ==========================================
// 分组与名单
// ==========================================

pub async fn get_group(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
) -> ApiResult<Json<GroupResponse>> {
    let prueba_api = state.prueba_api.clone();
    let group = run_blocking(move || prueba_api.get_group(&id, &group_id)).await?;
    Ok(Json(GroupResponse { group }))
}

/// 导入学生名单
///
/// 读取 multipart 中的 "file" 字段, 其余字段忽略
pub async fn import_roster(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(e.body_text()))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        ApiError::ValidationError("No se ha subido ningún archivo".to_string())
    })?;

    let prueba_api = state.prueba_api.clone();
    let result = run_blocking(move || {
        prueba_api.import_roster(&id, &group_id, &file_name, &bytes)
    })
    .await?;

    Ok(Json(ImportResponse {
        message: "Estudiantes importados exitosamente".to_string(),
        imported: result.imported,
        skipped: result.skipped,
        summary: result.summary,
        prueba: result.prueba,
    }))
}

// ==========================================
// 学生维护
// ==========================================

pub async fn create_student(
    State(state): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
    payload: Result<Json<CreateStudentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StudentResponse>)> {
    let request = json_body(payload)?;
    let prueba_api = state.prueba_api.clone();
    let student = run_blocking(move || {
        prueba_api.create_student(&id, &group_id, &request.document, &request.name)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(StudentResponse {
            message: "Estudiante creado exitosamente".to_string(),
            student,
        }),
    ))
}

/// 创建或更新学生; 新建返回 201
pub async fn upsert_student(
    State(state): State<AppState>,
    Path((id, group_id, student_id)): Path<(String, String, String)>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StudentResponse>)> {
    let patch = json_body(payload)?;
    let prueba_api = state.prueba_api.clone();
    let result = run_blocking(move || {
        prueba_api.upsert_student(&id, &group_id, &student_id, patch)
    })
    .await?;

    let (status, message) = if result.created {
        (StatusCode::CREATED, "Estudiante creado exitosamente")
    } else {
        (StatusCode::OK, "Estudiante actualizado exitosamente")
    };
    Ok((
        status,
        Json(StudentResponse {
            message: message.to_string(),
            student: result.student,
        }),
    ))
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path((id, group_id, student_id)): Path<(String, String, String)>,
) -> ApiResult<Json<PruebaMessageResponse>> {
    let prueba_api = state.prueba_api.clone();
    let prueba = run_blocking(move || {
        prueba_api.delete_student(&id, &group_id, &student_id)
    })
    .await?;
    Ok(prueba_message("Estudiante eliminado exitosamente", prueba))
}
