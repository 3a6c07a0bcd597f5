// ==========================================
// 学习成果评估系统 - 学术项目领域模型
// ==========================================
// 唯一性: (name, registry_code) 组合在所有项目中唯一
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Program - 学术项目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub faculty: String,               // 所属学院
    pub name: String,                  // 项目名称
    pub terms: u32,                    // 学期数
    pub registry_code: Option<String>, // 认证注册码 (registro calificado)
}

impl Program {
    /// 创建新的学术项目（自动生成ID）
    pub fn new(faculty: String, name: String, terms: u32, registry_code: Option<String>) -> Self {
        Self {
            id: crate::domain::types::new_id(),
            faculty,
            name,
            terms,
            registry_code,
        }
    }
}
