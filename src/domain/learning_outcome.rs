// ==========================================
// 学习成果评估系统 - 学习成果领域模型
// ==========================================
// 学习成果 (Resultado de Aprendizaje, RA) 与学术项目多对多关联
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// LearningOutcome - 学习成果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningOutcome {
    pub id: String,
    pub name: String,
    pub faculty: String,
    pub description: String,
    pub program_ids: Vec<String>, // 关联项目ID（仅存引用）
}

impl LearningOutcome {
    /// 创建新的学习成果（自动生成ID）
    pub fn new(name: String, faculty: String, description: String, program_ids: Vec<String>) -> Self {
        Self {
            id: crate::domain::types::new_id(),
            name,
            faculty,
            description,
            program_ids,
        }
    }

    /// 关联项目，跳过已关联的ID
    ///
    /// # 返回
    /// 本次新增的项目ID（保持输入顺序）
    pub fn add_programs(&mut self, program_ids: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for id in program_ids {
            if !self.program_ids.contains(id) && !added.contains(id) {
                added.push(id.clone());
            }
        }
        self.program_ids.extend(added.iter().cloned());
        added
    }

    /// 解除项目关联
    ///
    /// # 返回
    /// 实际解除的数量
    pub fn remove_programs(&mut self, program_ids: &[String]) -> usize {
        let before = self.program_ids.len();
        self.program_ids.retain(|id| !program_ids.contains(id));
        before - self.program_ids.len()
    }
}
