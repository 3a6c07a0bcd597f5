// ==========================================
// 学习成果评估系统 - 学习成果 (RA) API
// ==========================================
// 职责: 学习成果 CRUD 与项目关联维护
// 红线: 关联的项目必须存在
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::learning_outcome::LearningOutcome;
use crate::domain::program::Program;
use crate::repository::{LearningOutcomeRepository, ProgramRepository};

/// 创建学习成果请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "facultad")]
    pub faculty: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default, alias = "programas")]
    pub program_ids: Vec<String>,
}

/// 项目关联变更请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeProgramsRequest {
    #[serde(default, alias = "raId")]
    pub outcome_id: String,
    #[serde(default, alias = "programIds")]
    pub program_ids: Vec<String>,
}

/// 带项目详情的学习成果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeWithPrograms {
    pub id: String,
    pub name: String,
    pub faculty: String,
    pub description: String,
    pub programs: Vec<Program>,
}

// ==========================================
// LearningOutcomeApi - 学习成果 API
// ==========================================
pub struct LearningOutcomeApi {
    outcome_repo: Arc<LearningOutcomeRepository>,
    program_repo: Arc<ProgramRepository>,
}

impl LearningOutcomeApi {
    pub fn new(
        outcome_repo: Arc<LearningOutcomeRepository>,
        program_repo: Arc<ProgramRepository>,
    ) -> Self {
        Self {
            outcome_repo,
            program_repo,
        }
    }

    /// 创建学习成果
    #[instrument(skip(self, request))]
    pub fn create_outcome(&self, request: OutcomeRequest) -> ApiResult<LearningOutcome> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::ValidationError(
                "El nombre del resultado de aprendizaje es obligatorio".to_string(),
            ));
        }
        let mut program_ids = Vec::new();
        for id in request.program_ids {
            if !program_ids.contains(&id) {
                program_ids.push(id);
            }
        }
        self.ensure_programs_exist(&program_ids)?;

        let outcome = LearningOutcome::new(
            name,
            request.faculty.trim().to_string(),
            request.description,
            program_ids,
        );
        self.outcome_repo.create(&outcome)?;
        tracing::info!(outcome_id = %outcome.id, "学习成果创建成功");
        Ok(outcome)
    }

    /// 关联项目（已关联的跳过）
    ///
    /// # 返回
    /// - Err(ApiError::ValidationError): 全部项目都已关联
    #[instrument(skip(self, request), fields(outcome_id = %request.outcome_id))]
    pub fn add_programs(&self, request: OutcomeProgramsRequest) -> ApiResult<OutcomeWithPrograms> {
        let mut outcome = self.load(&request.outcome_id)?;
        self.ensure_programs_exist(&request.program_ids)?;

        let added = outcome.add_programs(&request.program_ids);
        if added.is_empty() {
            return Err(ApiError::ValidationError(
                "Todos los programas ya están agregados al Resultado de Aprendizaje".to_string(),
            ));
        }
        self.outcome_repo.update(&outcome)?;

        tracing::info!(added = added.len(), "项目关联成功");
        self.with_programs(outcome)
    }

    /// 解除项目关联
    #[instrument(skip(self, request), fields(outcome_id = %request.outcome_id))]
    pub fn remove_programs(&self, request: OutcomeProgramsRequest) -> ApiResult<OutcomeWithPrograms> {
        let mut outcome = self.load(&request.outcome_id)?;
        let removed = outcome.remove_programs(&request.program_ids);
        if removed > 0 {
            self.outcome_repo.update(&outcome)?;
        }
        tracing::info!(removed, "项目关联已解除");
        self.with_programs(outcome)
    }

    pub fn list_outcomes(&self) -> ApiResult<Vec<LearningOutcome>> {
        Ok(self.outcome_repo.find_all()?)
    }

    /// 查询全部学习成果（项目已解析）
    pub fn list_outcomes_with_programs(&self) -> ApiResult<Vec<OutcomeWithPrograms>> {
        let outcomes = self.outcome_repo.find_all()?;
        let mut ids: Vec<String> = outcomes.iter().flat_map(|o| o.program_ids.clone()).collect();
        ids.sort();
        ids.dedup();
        let programs: HashMap<String, Program> = self
            .program_repo
            .find_by_ids(&ids)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(outcomes
            .into_iter()
            .map(|o| resolve_programs(o, &programs))
            .collect())
    }

    pub fn get_outcome(&self, outcome_id: &str) -> ApiResult<OutcomeWithPrograms> {
        let outcome = self.load(outcome_id)?;
        self.with_programs(outcome)
    }

    /// 更新名称/学院/描述（项目关联不变）
    #[instrument(skip(self, request))]
    pub fn update_outcome(
        &self,
        outcome_id: &str,
        request: OutcomeRequest,
    ) -> ApiResult<OutcomeWithPrograms> {
        let mut outcome = self.load(outcome_id)?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::ValidationError(
                "El nombre del resultado de aprendizaje es obligatorio".to_string(),
            ));
        }

        outcome.name = name;
        outcome.faculty = request.faculty.trim().to_string();
        outcome.description = request.description;
        self.outcome_repo.update(&outcome)?;

        tracing::info!(outcome_id, "学习成果更新成功");
        self.with_programs(outcome)
    }

    #[instrument(skip(self))]
    pub fn delete_outcome(&self, outcome_id: &str) -> ApiResult<()> {
        if !self.outcome_repo.delete_by_id(outcome_id)? {
            return Err(ApiError::NotFound(
                "Resultado de Aprendizaje no encontrado".to_string(),
            ));
        }
        tracing::info!(outcome_id, "学习成果已删除");
        Ok(())
    }

    /// 查询项目下的学习成果
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 该项目没有任何学习成果
    pub fn list_by_program(&self, program_id: &str) -> ApiResult<Vec<LearningOutcome>> {
        let outcomes = self.outcome_repo.find_by_program(program_id)?;
        if outcomes.is_empty() {
            return Err(ApiError::NotFound(
                "No se encontraron resultados de aprendizaje para este programa".to_string(),
            ));
        }
        Ok(outcomes)
    }

    fn load(&self, outcome_id: &str) -> ApiResult<LearningOutcome> {
        self.outcome_repo
            .find_by_id(outcome_id)?
            .ok_or_else(|| ApiError::NotFound("Resultado de aprendizaje no encontrado".to_string()))
    }

    fn ensure_programs_exist(&self, program_ids: &[String]) -> ApiResult<()> {
        let mut unique = program_ids.to_vec();
        unique.sort();
        unique.dedup();
        let found = self.program_repo.find_by_ids(&unique)?;
        if found.len() != unique.len() {
            return Err(ApiError::NotFound(
                "Uno o más programas no fueron encontrados".to_string(),
            ));
        }
        Ok(())
    }

    fn with_programs(&self, outcome: LearningOutcome) -> ApiResult<OutcomeWithPrograms> {
        let programs: HashMap<String, Program> = self
            .program_repo
            .find_by_ids(&outcome.program_ids)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Ok(resolve_programs(outcome, &programs))
    }
}

/// 按关联顺序解析项目, 已删除的项目被忽略
fn resolve_programs(
    outcome: LearningOutcome,
    programs: &HashMap<String, Program>,
) -> OutcomeWithPrograms {
    OutcomeWithPrograms {
        programs: outcome
            .program_ids
            .iter()
            .filter_map(|id| programs.get(id).cloned())
            .collect(),
        id: outcome.id,
        name: outcome.name,
        faculty: outcome.faculty,
        description: outcome.description,
    }
}
