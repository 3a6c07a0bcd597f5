// ==========================================
// 学习成果评估系统 - 用户领域模型
// ==========================================
// 红线: 密码哈希与当前会话令牌不参与序列化输出
// ==========================================

use crate::domain::types::Role;
use serde::{Deserialize, Serialize};

// ==========================================
// User - 系统用户
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub cc: String, // 身份证件号 (cédula)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_names: Option<String>,
    pub last_names: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub current_token: Option<String>, // 最近一次登录签发的令牌
}

impl User {
    /// 展示用全名（缺失部分忽略）
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_names.as_deref(), self.last_names.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}
