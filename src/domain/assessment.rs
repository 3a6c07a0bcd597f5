// ==========================================
// 学习成果评估系统 - 测评 (Prueba) 聚合模型
// ==========================================
// 聚合根: Assessment
//   └─ Group (有序, 数量在创建/编辑时确定)
//        └─ RosterEntry (有序, 组内按 document 唯一)
//             └─ Grade (有序)
// ==========================================
// 红线: 整个测评作为一个一致性边界加载/保存
// 红线: 外部引用（项目/学习成果/负责人）只存ID
// 红线: 缓存平均值是派生数据, 由 AggregationEngine 全量重算
// ==========================================

use crate::domain::types::new_id;
use serde::{Deserialize, Serialize};

// ==========================================
// Grade - 成绩
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    pub outcome_id: String, // 学习成果ID
    pub score: f64,
}

impl Grade {
    pub fn new(outcome_id: String, score: f64) -> Self {
        Self {
            id: new_id(),
            outcome_id,
            score,
        }
    }
}

// ==========================================
// RosterEntry - 组内学生
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub document: String, // 证件号, 组内合并键
    pub name: String,
    #[serde(default)]
    pub grades: Vec<Grade>,
}

impl RosterEntry {
    /// 创建无成绩的学生条目
    pub fn new(document: String, name: String) -> Self {
        Self {
            id: new_id(),
            document,
            name,
            grades: Vec::new(),
        }
    }
}

// ==========================================
// OutcomeAverage - 单个学习成果的组内平均值（缓存）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeAverage {
    pub outcome_id: String,
    pub average: f64,
}

// ==========================================
// Group - 学生分组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,           // "Grupo N"
    pub responsible_id: String, // 负责评估人（用户ID）
    #[serde(default)]
    pub students: Vec<RosterEntry>,

    // ===== 派生缓存 =====
    #[serde(default)]
    pub outcome_averages: Vec<OutcomeAverage>,
    #[serde(default)]
    pub average: f64,
}

impl Group {
    /// 按序号创建空分组
    ///
    /// # 参数
    /// - `index`: 从 0 开始的分组序号，名称为 "Grupo {index + 1}"
    /// - `responsible_id`: 负责人用户ID
    pub fn new(index: usize, responsible_id: String) -> Self {
        Self {
            id: new_id(),
            name: format!("Grupo {}", index + 1),
            responsible_id,
            students: Vec::new(),
            outcome_averages: Vec::new(),
            average: 0.0,
        }
    }

    pub fn student(&self, student_id: &str) -> Option<&RosterEntry> {
        self.students.iter().find(|s| s.id == student_id)
    }

    pub fn student_mut(&mut self, student_id: &str) -> Option<&mut RosterEntry> {
        self.students.iter_mut().find(|s| s.id == student_id)
    }

    /// 组内是否已有该证件号（可排除某个条目自身）
    pub fn has_document(&self, document: &str, except_id: Option<&str>) -> bool {
        self.students
            .iter()
            .any(|s| s.document == document && Some(s.id.as_str()) != except_id)
    }

    /// 组内所有成绩（扁平化）
    pub fn grades(&self) -> impl Iterator<Item = &Grade> + '_ {
        self.students.iter().flat_map(|s| s.grades.iter())
    }
}

// ==========================================
// Assessment - 测评聚合根
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub name: String,
    pub program_id: String,
    pub outcome_ids: Vec<String>, // 非空, 顺序决定组内平均值的输出顺序
    pub description: String,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub average: f64, // 派生缓存
    pub semester: String,
    pub date: String,
}

impl Assessment {
    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn group_mut(&mut self, group_id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == group_id)
    }

    /// 测评内所有成绩（跨分组扁平化）
    pub fn grades(&self) -> impl Iterator<Item = &Grade> + '_ {
        self.groups.iter().flat_map(|g| g.grades())
    }

    pub fn has_outcome(&self, outcome_id: &str) -> bool {
        self.outcome_ids.iter().any(|id| id == outcome_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_naming_is_one_based() {
        let g = Group::new(0, "U1".to_string());
        assert_eq!(g.name, "Grupo 1");
        assert!(g.students.is_empty());
        assert_eq!(g.average, 0.0);
    }

    #[test]
    fn test_has_document_excludes_self() {
        let mut g = Group::new(0, "U1".to_string());
        let entry = RosterEntry::new("123".to_string(), "Ana".to_string());
        let id = entry.id.clone();
        g.students.push(entry);

        assert!(g.has_document("123", None));
        assert!(!g.has_document("123", Some(&id)));
        assert!(!g.has_document("456", None));
    }

    #[test]
    fn test_missing_cache_fields_deserialize_to_defaults() {
        let json = r#"{
            "id": "G1", "name": "Grupo 1", "responsibleId": "U1",
            "students": [{"id": "S1", "document": "1", "name": "Ana"}]
        }"#;
        let g: Group = serde_json::from_str(json).unwrap();
        assert!(g.outcome_averages.is_empty());
        assert!(g.students[0].grades.is_empty());
        assert_eq!(g.average, 0.0);
    }
}
