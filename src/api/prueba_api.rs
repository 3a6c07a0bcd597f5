// ==========================================
// 学习成果评估系统 - 测评 (Prueba) API
// ==========================================
// 职责: 测评聚合的创建/编辑/查询/删除, 名单导入, 学生维护
// 流程: 加载聚合 → 引擎修改 → 重算平均值 → 整聚合保存
// 红线: 校验与引用存在性检查全部先于写入
// 红线: 编辑是破坏性重置（重建全部分组, 清空名单与成绩）
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::prueba_view::{AssessmentDetail, GroupDetail, ReferenceIndex, StudentDetail};
use crate::domain::assessment::{Assessment, Group};
use crate::domain::types::new_id;
use crate::engine::{
    AggregationEngine, GroupPlanner, RosterMergeSummary, RosterMerger, StudentEditor, StudentPatch,
};
use crate::importer::UniversalFileParser;
use crate::repository::{
    AssessmentRepository, LearningOutcomeRepository, ProgramRepository, UserRepository,
};

// ==========================================
// 请求 / 响应类型
// ==========================================

/// 创建/编辑测评请求（兼容原有西语字段名）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "programaId")]
    pub program_id: String,
    #[serde(default, alias = "raIds")]
    pub learning_outcome_ids: Vec<String>,
    #[serde(default, alias = "semestre")]
    pub semester: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default, alias = "cantidadGrupos")]
    pub group_count: usize,
    #[serde(default, alias = "usuarios")]
    pub responsible_user_ids: Vec<String>,
    #[serde(default, alias = "fecha")]
    pub date: Option<String>,
}

/// 名单导入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterImportResponse {
    pub imported: usize,
    pub skipped: usize,
    pub summary: RosterMergeSummary,
    pub prueba: AssessmentDetail,
}

/// 学生创建或更新结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpsertResponse {
    pub created: bool,
    pub student: StudentDetail,
}

/// 校验通过的测评请求
struct ValidatedRequest {
    name: String,
    program_id: String,
    outcome_ids: Vec<String>,
    responsible_ids: Vec<String>,
    semester: String,
    description: String,
    /// 未提供时为 None: 创建取当天, 编辑保留原值
    date: Option<String>,
}

// ==========================================
// PruebaApi - 测评 API
// ==========================================
pub struct PruebaApi {
    prueba_repo: Arc<dyn AssessmentRepository>,
    program_repo: Arc<ProgramRepository>,
    outcome_repo: Arc<LearningOutcomeRepository>,
    user_repo: Arc<UserRepository>,
    aggregation: AggregationEngine,
    planner: GroupPlanner,
    merger: RosterMerger,
    editor: StudentEditor,
    parser: UniversalFileParser,
}

impl PruebaApi {
    /// 创建新的PruebaApi实例
    pub fn new(
        prueba_repo: Arc<dyn AssessmentRepository>,
        program_repo: Arc<ProgramRepository>,
        outcome_repo: Arc<LearningOutcomeRepository>,
        user_repo: Arc<UserRepository>,
    ) -> Self {
        Self {
            prueba_repo,
            program_repo,
            outcome_repo,
            user_repo,
            aggregation: AggregationEngine::new(),
            planner: GroupPlanner::new(),
            merger: RosterMerger::new(),
            editor: StudentEditor::new(),
            parser: UniversalFileParser,
        }
    }

    // ==========================================
    // 测评生命周期
    // ==========================================

    /// 创建测评
    ///
    /// # 返回
    /// - Ok(AssessmentDetail): 新测评（名单为空, 平均值为 0）
    /// - Err(ApiError::ValidationError): 参数不合法（未写入任何记录）
    /// - Err(ApiError::NotFound): 项目/学习成果/负责人不存在（未写入任何记录）
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub fn create_prueba(&self, request: AssessmentRequest) -> ApiResult<AssessmentDetail> {
        let validated = self.validate_request(request)?;
        let groups = self.planner.build_groups(&validated.responsible_ids);

        let mut assessment = Assessment {
            id: new_id(),
            name: validated.name,
            program_id: validated.program_id,
            outcome_ids: validated.outcome_ids,
            description: validated.description,
            groups,
            average: 0.0,
            semester: validated.semester,
            date: validated
                .date
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        };
        self.aggregation.recompute_assessment(&mut assessment);
        self.prueba_repo.create(&assessment)?;

        tracing::info!(prueba_id = %assessment.id, groups = assessment.groups.len(), "测评创建成功");
        self.detail_of(&assessment)
    }

    /// 编辑测评（分组整体重建）
    #[instrument(skip(self, request))]
    pub fn edit_prueba(&self, prueba_id: &str, request: AssessmentRequest) -> ApiResult<AssessmentDetail> {
        let mut assessment = self.load(prueba_id)?;
        let validated = self.validate_request(request)?;

        assessment.name = validated.name;
        assessment.program_id = validated.program_id;
        assessment.outcome_ids = validated.outcome_ids;
        assessment.semester = validated.semester;
        assessment.description = validated.description;
        if let Some(date) = validated.date {
            assessment.date = date;
        }
        assessment.groups = self.planner.build_groups(&validated.responsible_ids);

        self.aggregation.recompute_assessment(&mut assessment);
        self.prueba_repo.save(&assessment)?;

        tracing::info!(prueba_id, groups = assessment.groups.len(), "测评编辑成功, 分组已重置");
        self.detail_of(&assessment)
    }

    /// 查询全部测评（含重算后的平均值）
    #[instrument(skip(self))]
    pub fn list_pruebas(&self) -> ApiResult<Vec<AssessmentDetail>> {
        let mut assessments = self.prueba_repo.find_all()?;
        for assessment in assessments.iter_mut() {
            self.refresh_averages(assessment)?;
        }

        let index = self.reference_index(&assessments)?;
        Ok(assessments.iter().map(|a| index.assessment_detail(a)).collect())
    }

    /// 查询单个测评（含重算后的平均值）
    #[instrument(skip(self))]
    pub fn get_prueba(&self, prueba_id: &str) -> ApiResult<AssessmentDetail> {
        let mut assessment = self.load(prueba_id)?;
        self.refresh_averages(&mut assessment)?;
        self.detail_of(&assessment)
    }

    /// 删除测评
    #[instrument(skip(self))]
    pub fn delete_prueba(&self, prueba_id: &str) -> ApiResult<()> {
        require_id(prueba_id, "ID de la prueba")?;
        if !self.prueba_repo.delete_by_id(prueba_id)? {
            return Err(ApiError::NotFound("Prueba no encontrada".to_string()));
        }
        tracing::info!(prueba_id, "测评已删除");
        Ok(())
    }

    // ==========================================
    // 分组与名单
    // ==========================================

    /// 查询分组（学生按姓名排序, 负责人已解析）
    #[instrument(skip(self))]
    pub fn get_group(&self, prueba_id: &str, group_id: &str) -> ApiResult<GroupDetail> {
        let mut assessment = self.load(prueba_id)?;
        self.refresh_averages(&mut assessment)?;

        let group = find_group(&assessment, group_id)?;
        let index = self.reference_index(std::slice::from_ref(&assessment))?;
        let mut detail = index.group_detail(group);
        detail
            .students
            .sort_by_cached_key(|s| s.name.to_lowercase());
        Ok(detail)
    }

    /// 从上传文件导入名单到分组
    ///
    /// # 参数
    /// - `file_name`: 上传文件名（决定解析格式）
    /// - `bytes`: 文件内容
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn import_roster(
        &self,
        prueba_id: &str,
        group_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> ApiResult<RosterImportResponse> {
        let mut assessment = self.load(prueba_id)?;
        find_group(&assessment, group_id)?;

        let rows = self.parser.parse(file_name, bytes)?;
        let group = find_group_mut(&mut assessment, group_id)?;
        let summary = self.merger.merge_rows(group, rows)?;

        self.aggregation.recompute_assessment(&mut assessment);
        self.prueba_repo.save(&assessment)?;

        tracing::info!(prueba_id, group_id, imported = summary.imported, "名单导入成功");
        Ok(RosterImportResponse {
            imported: summary.imported,
            skipped: summary.skipped(),
            summary,
            prueba: self.detail_of(&assessment)?,
        })
    }

    // ==========================================
    // 学生维护
    // ==========================================

    /// 新增学生（证件号组内唯一）
    #[instrument(skip(self))]
    pub fn create_student(
        &self,
        prueba_id: &str,
        group_id: &str,
        document: &str,
        name: &str,
    ) -> ApiResult<StudentDetail> {
        if document.trim().is_empty() || name.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "El campo \"documento\" y \"nombre\" son obligatorios".to_string(),
            ));
        }

        let mut assessment = self.load(prueba_id)?;
        let group = find_group_mut(&mut assessment, group_id)?;
        let entry = self.editor.create_student(group, document, name)?;

        self.aggregation.recompute_assessment(&mut assessment);
        self.prueba_repo.save(&assessment)?;

        tracing::info!(prueba_id, group_id, student_id = %entry.id, "学生创建成功");
        let index = self.reference_index(std::slice::from_ref(&assessment))?;
        Ok(index.student_detail(&entry))
    }

    /// 创建或更新学生（姓名/证件号/成绩）
    #[instrument(skip(self, patch))]
    pub fn upsert_student(
        &self,
        prueba_id: &str,
        group_id: &str,
        student_id: &str,
        patch: StudentPatch,
    ) -> ApiResult<StudentUpsertResponse> {
        let mut assessment = self.load(prueba_id)?;
        let allowed_outcomes = assessment.outcome_ids.clone();
        let group = find_group_mut(&mut assessment, group_id)?;
        let outcome = self
            .editor
            .upsert_student(group, student_id, patch, &allowed_outcomes)?;

        self.aggregation.recompute_assessment(&mut assessment);
        self.prueba_repo.save(&assessment)?;

        tracing::info!(
            prueba_id,
            group_id,
            student_id = %outcome.entry.id,
            created = outcome.created,
            "学生保存成功"
        );
        let index = self.reference_index(std::slice::from_ref(&assessment))?;
        Ok(StudentUpsertResponse {
            created: outcome.created,
            student: index.student_detail(&outcome.entry),
        })
    }

    /// 删除学生
    #[instrument(skip(self))]
    pub fn delete_student(
        &self,
        prueba_id: &str,
        group_id: &str,
        student_id: &str,
    ) -> ApiResult<AssessmentDetail> {
        let mut assessment = self.load(prueba_id)?;
        let group = find_group_mut(&mut assessment, group_id)?;
        self.editor.remove_student(group, student_id)?;

        self.aggregation.recompute_assessment(&mut assessment);
        self.prueba_repo.save(&assessment)?;

        tracing::info!(prueba_id, group_id, student_id, "学生已删除");
        self.detail_of(&assessment)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load(&self, prueba_id: &str) -> ApiResult<Assessment> {
        require_id(prueba_id, "ID de la prueba")?;
        self.prueba_repo
            .find_by_id(prueba_id)?
            .ok_or_else(|| ApiError::NotFound("Prueba no encontrada".to_string()))
    }

    /// 重算平均值, 仅在缓存变化时落库
    fn refresh_averages(&self, assessment: &mut Assessment) -> ApiResult<()> {
        if self.aggregation.recompute_assessment(assessment) {
            self.prueba_repo.save(assessment)?;
        }
        Ok(())
    }

    fn reference_index(&self, assessments: &[Assessment]) -> ApiResult<ReferenceIndex> {
        ReferenceIndex::load(
            assessments,
            &self.program_repo,
            &self.outcome_repo,
            &self.user_repo,
        )
    }

    fn detail_of(&self, assessment: &Assessment) -> ApiResult<AssessmentDetail> {
        let index = self.reference_index(std::slice::from_ref(assessment))?;
        Ok(index.assessment_detail(assessment))
    }

    /// 校验创建/编辑请求
    ///
    /// 顺序: 字段格式 → 分组参数 → 项目 → 学习成果 → 负责人
    fn validate_request(&self, request: AssessmentRequest) -> ApiResult<ValidatedRequest> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::ValidationError(
                "El nombre de la prueba es obligatorio".to_string(),
            ));
        }
        let program_id = request.program_id.trim().to_string();
        if program_id.is_empty() {
            return Err(ApiError::ValidationError("El programa es obligatorio".to_string()));
        }

        let outcome_ids: Vec<String> = request
            .learning_outcome_ids
            .iter()
            .map(|id| id.trim().to_string())
            .collect();
        if outcome_ids.is_empty() || outcome_ids.iter().any(|id| id.is_empty()) {
            return Err(ApiError::ValidationError(
                "Debe indicar al menos un resultado de aprendizaje".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if !outcome_ids.iter().all(|id| seen.insert(id.as_str())) {
            return Err(ApiError::ValidationError(
                "Los resultados de aprendizaje no pueden repetirse".to_string(),
            ));
        }

        let responsible_ids = self
            .planner
            .plan(request.group_count, &request.responsible_user_ids)?;

        if self.program_repo.find_by_id(&program_id)?.is_none() {
            return Err(ApiError::NotFound("Programa no encontrado".to_string()));
        }

        let found = self.outcome_repo.find_by_ids(&outcome_ids)?;
        if found.len() != outcome_ids.len() {
            return Err(ApiError::NotFound(
                "Uno o más resultados de aprendizaje no encontrados".to_string(),
            ));
        }

        for user_id in &responsible_ids {
            if self.user_repo.find_by_id(user_id)?.is_none() {
                tracing::warn!(user_id = %user_id, "负责人不存在");
                return Err(ApiError::NotFound(format!("Encargado {} no encontrado", user_id)));
            }
        }

        let date = request
            .date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(ValidatedRequest {
            name,
            program_id,
            outcome_ids,
            responsible_ids,
            semester: request.semester.trim().to_string(),
            description: request.description,
            date,
        })
    }
}

fn require_id(id: &str, what: &str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{} no puede estar vacío", what)));
    }
    Ok(())
}

fn find_group<'a>(assessment: &'a Assessment, group_id: &str) -> ApiResult<&'a Group> {
    assessment
        .group(group_id)
        .ok_or_else(|| ApiError::NotFound("Grupo no encontrado".to_string()))
}

fn find_group_mut<'a>(assessment: &'a mut Assessment, group_id: &str) -> ApiResult<&'a mut Group> {
    assessment
        .group_mut(group_id)
        .ok_or_else(|| ApiError::NotFound("Grupo no encontrado".to_string()))
}
