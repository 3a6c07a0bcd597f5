// ==========================================
// 学习成果评估系统 - 学术项目 API
// ==========================================
// 职责: 项目的创建/查询/更新/删除
// 红线: (名称, 注册码) 组合唯一
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::program::Program;
use crate::repository::ProgramRepository;

/// 项目创建/更新请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRequest {
    #[serde(default, alias = "facultad")]
    pub faculty: String,
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "semestres")]
    pub terms: u32,
    #[serde(default, alias = "registroCalificado")]
    pub registry_code: Option<String>,
}

impl ProgramRequest {
    fn normalized(self) -> ApiResult<(String, String, u32, Option<String>)> {
        let faculty = self.faculty.trim().to_string();
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::ValidationError(
                "El nombre del programa es obligatorio".to_string(),
            ));
        }
        if faculty.is_empty() {
            return Err(ApiError::ValidationError("La facultad es obligatoria".to_string()));
        }
        let registry_code = self
            .registry_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok((faculty, name, self.terms, registry_code))
    }
}

// ==========================================
// ProgramApi - 学术项目 API
// ==========================================
pub struct ProgramApi {
    program_repo: Arc<ProgramRepository>,
}

impl ProgramApi {
    pub fn new(program_repo: Arc<ProgramRepository>) -> Self {
        Self { program_repo }
    }

    /// 创建项目
    ///
    /// # 返回
    /// - Err(ApiError::Conflict): 同名同注册码的项目已存在
    #[instrument(skip(self, request))]
    pub fn create_program(&self, request: ProgramRequest) -> ApiResult<Program> {
        let (faculty, name, terms, registry_code) = request.normalized()?;

        if self
            .program_repo
            .find_by_name_and_code(&name, registry_code.as_deref())?
            .is_some()
        {
            return Err(ApiError::Conflict("Ya existe este programa".to_string()));
        }

        let program = Program::new(faculty, name, terms, registry_code);
        self.program_repo.create(&program)?;
        tracing::info!(program_id = %program.id, "项目创建成功");
        Ok(program)
    }

    pub fn list_programs(&self) -> ApiResult<Vec<Program>> {
        Ok(self.program_repo.find_all()?)
    }

    pub fn get_program(&self, program_id: &str) -> ApiResult<Program> {
        self.program_repo
            .find_by_id(program_id)?
            .ok_or_else(|| ApiError::NotFound("Programa no encontrado".to_string()))
    }

    /// 更新项目
    ///
    /// 唯一性只与其他项目比较
    #[instrument(skip(self, request))]
    pub fn update_program(&self, program_id: &str, request: ProgramRequest) -> ApiResult<Program> {
        let mut program = self.get_program(program_id)?;
        let (faculty, name, terms, registry_code) = request.normalized()?;

        if let Some(other) = self
            .program_repo
            .find_by_name_and_code(&name, registry_code.as_deref())?
        {
            if other.id != program.id {
                return Err(ApiError::Conflict("Ya existe este programa".to_string()));
            }
        }

        program.faculty = faculty;
        program.name = name;
        program.terms = terms;
        program.registry_code = registry_code;
        self.program_repo.update(&program)?;

        tracing::info!(program_id, "项目更新成功");
        Ok(program)
    }

    #[instrument(skip(self))]
    pub fn delete_program(&self, program_id: &str) -> ApiResult<()> {
        if !self.program_repo.delete_by_id(program_id)? {
            return Err(ApiError::NotFound("Programa no encontrado".to_string()));
        }
        tracing::info!(program_id, "项目已删除");
        Ok(())
    }
}
