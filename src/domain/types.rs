// ==========================================
// 学习成果评估系统 - 领域类型定义
// ==========================================
// 职责: 跨实体共享的枚举与值类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 用户角色 (Role)
// ==========================================
// 序列化格式与数据库一致: admin / Coordinador / Evaluador / Profesor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin, // 系统管理员
    #[serde(rename = "Coordinador")]
    Coordinator, // 协调人
    #[default]
    #[serde(rename = "Evaluador")]
    Evaluator, // 评估人（默认）
    #[serde(rename = "Profesor")]
    Professor, // 教师
}

impl Role {
    /// 从数据库字符串解析（未知值回退为 Evaluador）
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            "admin" => Role::Admin,
            "Coordinador" => Role::Coordinator,
            "Profesor" => Role::Professor,
            _ => Role::Evaluator,
        }
    }

    /// 转换为数据库字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coordinator => "Coordinador",
            Role::Evaluator => "Evaluador",
            Role::Professor => "Profesor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

/// 生成新的实体ID
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_db_roundtrip() {
        for role in [Role::Admin, Role::Coordinator, Role::Evaluator, Role::Professor] {
            assert_eq!(Role::from_str(role.to_db_str()), role);
        }
        assert_eq!(Role::from_str("desconocido"), Role::Evaluator);
    }

    #[test]
    fn test_role_serde_names() {
        let json = serde_json::to_string(&Role::Coordinator).unwrap();
        assert_eq!(json, "\"Coordinador\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
