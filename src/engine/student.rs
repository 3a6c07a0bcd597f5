// ==========================================
// 学习成果评估系统 - 单个学生维护
// ==========================================
// 职责: 组内学生的新增 / 创建或更新 / 删除
// ==========================================
// 更新语义:
// - 姓名/证件号只在提供非空值时替换（部分更新）
// - 提供成绩列表时整体替换成绩集合（不合并）
//   * 带成绩ID的元素: 保留该ID, 缺失字段由原成绩补齐
//   * 不带ID但同时有 outcome_id 与 score: 新建成绩
//   * 其余元素: 丢弃
// - 未提供成绩列表时保留原成绩
// 红线: 成绩的学习成果必须属于测评的学习成果集合
// 红线: 证件号组内唯一
// 红线: 校验全部通过后才修改分组
// ==========================================

use crate::domain::assessment::{Grade, Group, RosterEntry};
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::instrument;

/// 成绩输入元素
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeInput {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default, alias = "ra", alias = "outcomeId")]
    pub outcome_id: Option<String>,
    #[serde(default, alias = "nota")]
    pub score: Option<f64>,
}

/// 学生创建/更新输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentPatch {
    #[serde(default, alias = "documento")]
    pub document: Option<String>,
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "notas")]
    pub grades: Option<Vec<GradeInput>>,
}

/// 创建或更新的结果
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub entry: RosterEntry,
    pub created: bool,
}

// ==========================================
// StudentEditor - 学生维护
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct StudentEditor;

impl StudentEditor {
    pub fn new() -> Self {
        Self
    }

    /// 严格新增学生（证件号重复则拒绝）
    #[instrument(skip(self, group), fields(group_id = %group.id))]
    pub fn create_student(
        &self,
        group: &mut Group,
        document: &str,
        name: &str,
    ) -> EngineResult<RosterEntry> {
        let document = non_empty(Some(document))
            .ok_or_else(required_fields_error)?;
        let name = non_empty(Some(name)).ok_or_else(required_fields_error)?;

        if group.has_document(&document, None) {
            return Err(EngineError::Validation(
                "El estudiante con este documento ya existe en el grupo".to_string(),
            ));
        }

        let entry = RosterEntry::new(document, name);
        group.students.push(entry.clone());
        Ok(entry)
    }

    /// 创建或更新学生
    ///
    /// # 参数
    /// - `group`: 目标分组
    /// - `student_id`: 学生条目ID（不存在时新建条目, 使用新生成的ID）
    /// - `patch`: 输入字段
    /// - `allowed_outcomes`: 测评的学习成果ID集合
    #[instrument(skip(self, group, patch, allowed_outcomes), fields(group_id = %group.id))]
    pub fn upsert_student(
        &self,
        group: &mut Group,
        student_id: &str,
        patch: StudentPatch,
        allowed_outcomes: &[String],
    ) -> EngineResult<UpsertOutcome> {
        let document = non_empty(patch.document.as_deref());
        let name = non_empty(patch.name.as_deref());

        if let Some(existing) = group.student(student_id) {
            let grades = match patch.grades {
                Some(inputs) => Some(resolve_grades(&existing.grades, inputs, allowed_outcomes)?),
                None => None,
            };

            if let Some(doc) = document.as_deref() {
                if group.has_document(doc, Some(student_id)) {
                    return Err(EngineError::Validation(format!(
                        "Otro estudiante del grupo ya tiene el documento {}",
                        doc
                    )));
                }
            }

            let entry = group
                .student_mut(student_id)
                .ok_or_else(|| EngineError::not_found("Estudiante", student_id))?;
            if let Some(name) = name {
                entry.name = name;
            }
            if let Some(document) = document {
                entry.document = document;
            }
            if let Some(grades) = grades {
                entry.grades = grades;
            }

            return Ok(UpsertOutcome {
                entry: entry.clone(),
                created: false,
            });
        }

        let (document, name) = match (document, name) {
            (Some(d), Some(n)) => (d, n),
            _ => {
                return Err(EngineError::Validation(
                    "Documento y nombre son obligatorios para crear un nuevo estudiante"
                        .to_string(),
                ))
            }
        };
        if group.has_document(&document, None) {
            return Err(EngineError::Validation(
                "El estudiante con este documento ya existe en el grupo".to_string(),
            ));
        }

        let grades = resolve_grades(&[], patch.grades.unwrap_or_default(), allowed_outcomes)?;
        let mut entry = RosterEntry::new(document, name);
        entry.grades = grades;
        group.students.push(entry.clone());

        Ok(UpsertOutcome {
            entry,
            created: true,
        })
    }

    /// 删除学生
    pub fn remove_student(&self, group: &mut Group, student_id: &str) -> EngineResult<RosterEntry> {
        let idx = group
            .students
            .iter()
            .position(|s| s.id == student_id)
            .ok_or_else(|| EngineError::not_found("Estudiante", student_id))?;
        Ok(group.students.remove(idx))
    }
}

fn required_fields_error() -> EngineError {
    EngineError::Validation("El campo \"documento\" y \"nombre\" son obligatorios".to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 将成绩输入解析为新的成绩集合
fn resolve_grades(
    existing: &[Grade],
    inputs: Vec<GradeInput>,
    allowed_outcomes: &[String],
) -> EngineResult<Vec<Grade>> {
    let mut grades = Vec::with_capacity(inputs.len());
    let mut seen_ids = HashSet::new();

    for input in inputs {
        let id = non_empty(input.id.as_deref());
        let outcome_id = non_empty(input.outcome_id.as_deref());

        let grade = match id {
            Some(id) => {
                let previous = existing.iter().find(|g| g.id == id);
                let outcome_id = outcome_id.or_else(|| previous.map(|g| g.outcome_id.clone()));
                let score = input.score.or_else(|| previous.map(|g| g.score));
                match (outcome_id, score) {
                    (Some(outcome_id), Some(score)) => Some(Grade {
                        id,
                        outcome_id,
                        score,
                    }),
                    _ => None,
                }
            }
            None => match (outcome_id, input.score) {
                (Some(outcome_id), Some(score)) => Some(Grade::new(outcome_id, score)),
                _ => None,
            },
        };

        let Some(grade) = grade else {
            tracing::debug!("成绩元素缺少必要字段, 已丢弃");
            continue;
        };

        if !grade.score.is_finite() {
            return Err(EngineError::Validation(format!(
                "Nota inválida para el resultado de aprendizaje {}",
                grade.outcome_id
            )));
        }
        if !allowed_outcomes.contains(&grade.outcome_id) {
            return Err(EngineError::Validation(format!(
                "El resultado de aprendizaje {} no pertenece a la prueba",
                grade.outcome_id
            )));
        }
        // 同一 id 只保留首次出现的元素
        if !seen_ids.insert(grade.id.clone()) {
            tracing::warn!(grade_id = %grade.id, "成绩 id 重复, 已丢弃");
            continue;
        }
        grades.push(grade);
    }

    Ok(grades)
}
