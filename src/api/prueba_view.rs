// ==========================================
// 学习成果评估系统 - 测评展示视图
// ==========================================
// 职责: 读路径上的引用解析（项目/学习成果/负责人 → 名称）
// 红线: 只生成视图, 不改变存储的 ID 形态
// 红线: 引用失效时对应字段为 None, 不报错
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::assessment::{Assessment, Grade, Group, RosterEntry};
use crate::domain::learning_outcome::LearningOutcome;
use crate::domain::program::Program;
use crate::domain::user::User;
use crate::repository::{LearningOutcomeRepository, ProgramRepository, UserRepository};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ==========================================
// 视图类型
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSummary {
    pub id: String,
    pub name: String,
    pub faculty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSummary {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsibleSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDetail {
    pub id: String,
    pub outcome_id: String,
    pub outcome_name: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetail {
    pub id: String,
    pub document: String,
    pub name: String,
    pub grades: Vec<GradeDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeAverageDetail {
    pub outcome_id: String,
    pub outcome_name: Option<String>,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    pub id: String,
    pub name: String,
    pub responsible_id: String,
    pub responsible: Option<ResponsibleSummary>,
    pub students: Vec<StudentDetail>,
    pub outcome_averages: Vec<OutcomeAverageDetail>,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetail {
    pub id: String,
    pub name: String,
    pub program_id: String,
    pub program: Option<ProgramSummary>,
    pub learning_outcomes: Vec<OutcomeSummary>,
    pub description: String,
    pub semester: String,
    pub date: String,
    pub groups: Vec<GroupDetail>,
    pub average: f64,
}

// ==========================================
// ReferenceIndex - 一次性批量加载的引用索引
// ==========================================
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    programs: HashMap<String, Program>,
    outcomes: HashMap<String, LearningOutcome>,
    users: HashMap<String, User>,
}

impl ReferenceIndex {
    /// 收集测评中出现的全部引用ID并批量加载
    pub fn load(
        assessments: &[Assessment],
        program_repo: &ProgramRepository,
        outcome_repo: &LearningOutcomeRepository,
        user_repo: &UserRepository,
    ) -> ApiResult<Self> {
        let mut program_ids = BTreeSet::new();
        let mut outcome_ids = BTreeSet::new();
        let mut user_ids = BTreeSet::new();

        for a in assessments {
            program_ids.insert(a.program_id.clone());
            outcome_ids.extend(a.outcome_ids.iter().cloned());
            for g in &a.groups {
                user_ids.insert(g.responsible_id.clone());
                outcome_ids.extend(g.grades().map(|grade| grade.outcome_id.clone()));
            }
        }

        let to_vec = |set: BTreeSet<String>| set.into_iter().collect::<Vec<_>>();

        Ok(Self {
            programs: program_repo
                .find_by_ids(&to_vec(program_ids))?
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
            outcomes: outcome_repo
                .find_by_ids(&to_vec(outcome_ids))?
                .into_iter()
                .map(|o| (o.id.clone(), o))
                .collect(),
            users: user_repo
                .find_by_ids(&to_vec(user_ids))?
                .into_iter()
                .map(|u| (u.id.clone(), u))
                .collect(),
        })
    }

    pub fn assessment_detail(&self, assessment: &Assessment) -> AssessmentDetail {
        AssessmentDetail {
            id: assessment.id.clone(),
            name: assessment.name.clone(),
            program_id: assessment.program_id.clone(),
            program: self.programs.get(&assessment.program_id).map(|p| ProgramSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                faculty: p.faculty.clone(),
            }),
            learning_outcomes: assessment
                .outcome_ids
                .iter()
                .map(|id| {
                    let outcome = self.outcomes.get(id);
                    OutcomeSummary {
                        id: id.clone(),
                        name: outcome.map(|o| o.name.clone()),
                        description: outcome.map(|o| o.description.clone()),
                    }
                })
                .collect(),
            description: assessment.description.clone(),
            semester: assessment.semester.clone(),
            date: assessment.date.clone(),
            groups: assessment.groups.iter().map(|g| self.group_detail(g)).collect(),
            average: assessment.average,
        }
    }

    pub fn group_detail(&self, group: &Group) -> GroupDetail {
        GroupDetail {
            id: group.id.clone(),
            name: group.name.clone(),
            responsible_id: group.responsible_id.clone(),
            responsible: self.users.get(&group.responsible_id).map(|u| ResponsibleSummary {
                id: u.id.clone(),
                username: u.username.clone(),
                full_name: u.display_name(),
            }),
            students: group.students.iter().map(|s| self.student_detail(s)).collect(),
            outcome_averages: group
                .outcome_averages
                .iter()
                .map(|oa| OutcomeAverageDetail {
                    outcome_id: oa.outcome_id.clone(),
                    outcome_name: self.outcome_name(&oa.outcome_id),
                    average: oa.average,
                })
                .collect(),
            average: group.average,
        }
    }

    pub fn student_detail(&self, entry: &RosterEntry) -> StudentDetail {
        StudentDetail {
            id: entry.id.clone(),
            document: entry.document.clone(),
            name: entry.name.clone(),
            grades: entry.grades.iter().map(|g| self.grade_detail(g)).collect(),
        }
    }

    fn grade_detail(&self, grade: &Grade) -> GradeDetail {
        GradeDetail {
            id: grade.id.clone(),
            outcome_id: grade.outcome_id.clone(),
            outcome_name: self.outcome_name(&grade.outcome_id),
            score: grade.score,
        }
    }

    fn outcome_name(&self, id: &str) -> Option<String> {
        self.outcomes.get(id).map(|o| o.name.clone())
    }
}
