// ==========================================
// 学习成果评估系统 - 用户与会话 API
// ==========================================
// 职责: 注册/登录/登出/更新/删除/查询, 密码重置, 令牌认证
// 工具: bcrypt 哈希密码, TokenService 签发令牌
// 红线: 密码哈希永不返回给调用方
// 红线: 登出吊销令牌, 吊销记录超过令牌有效期后清理
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::mailer::PasswordResetMailer;
use crate::api::session::{Claims, TokenService};
use crate::domain::types::{new_id, Role};
use crate::domain::user::User;
use crate::repository::{RevokedTokenRepository, UserRepository};

/// 重置密码长度
pub const RESET_PASSWORD_LENGTH: usize = 10;

// ==========================================
// 请求 / 响应类型
// ==========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub cc: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "nombres")]
    pub first_names: Option<String>,
    #[serde(default, alias = "apellidos")]
    pub last_names: Option<String>,
    #[serde(default, alias = "celular")]
    pub phone: Option<String>,
    #[serde(default, alias = "correo")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// 更新请求（只替换提供的字段）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, alias = "newUsername")]
    pub username: Option<String>,
    #[serde(default, alias = "newCc")]
    pub cc: Option<String>,
    #[serde(default, alias = "newPassword")]
    pub password: Option<String>,
    #[serde(default, alias = "newNombres")]
    pub first_names: Option<String>,
    #[serde(default, alias = "newApellidos")]
    pub last_names: Option<String>,
    #[serde(default, alias = "newCelular")]
    pub phone: Option<String>,
    #[serde(default, alias = "newCorreo")]
    pub email: Option<String>,
    #[serde(default, alias = "newRole")]
    pub role: Option<Role>,
}

// ==========================================
// UserApi - 用户与会话 API
// ==========================================
pub struct UserApi {
    user_repo: Arc<UserRepository>,
    revoked_repo: Arc<RevokedTokenRepository>,
    tokens: TokenService,
    mailer: Arc<dyn PasswordResetMailer>,
    bcrypt_cost: u32,
}

impl UserApi {
    pub fn new(
        user_repo: Arc<UserRepository>,
        revoked_repo: Arc<RevokedTokenRepository>,
        tokens: TokenService,
        mailer: Arc<dyn PasswordResetMailer>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            user_repo,
            revoked_repo,
            tokens,
            mailer,
            bcrypt_cost,
        }
    }

    /// 注册用户
    ///
    /// # 返回
    /// - Err(ApiError::Conflict): 用户名已存在
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub fn register(&self, request: RegisterRequest) -> ApiResult<User> {
        let username = request.username.trim().to_string();
        if username.is_empty() || request.cc.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::ValidationError(
                "Usuario, cédula y contraseña son obligatorios".to_string(),
            ));
        }
        if self.user_repo.find_by_username(&username)?.is_some() {
            return Err(ApiError::Conflict("El usuario ya existe".to_string()));
        }

        let user = User {
            id: new_id(),
            username,
            cc: request.cc.trim().to_string(),
            password_hash: self.hash_password(&request.password)?,
            first_names: request.first_names,
            last_names: request.last_names,
            phone: request.phone,
            email: request.email,
            role: request.role.unwrap_or_default(),
            current_token: None,
        };
        self.user_repo.create(&user)?;

        tracing::info!(user_id = %user.id, role = %user.role, "用户注册成功");
        Ok(user)
    }

    /// 登录, 签发令牌并记为当前会话
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        let invalid = || ApiError::ValidationError("Credenciales inválidas".to_string());

        let mut user = self
            .user_repo
            .find_by_username(request.username.trim())?
            .ok_or_else(invalid)?;

        let matches = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|e| ApiError::InternalError(format!("密码校验失败: {}", e)))?;
        if !matches {
            tracing::warn!("密码错误");
            return Err(invalid());
        }

        let token = self.tokens.issue(&user.id)?;
        self.user_repo.set_current_token(&user.id, Some(&token))?;
        user.current_token = Some(token.clone());

        tracing::info!(user_id = %user.id, "登录成功");
        Ok(LoginResponse { token, user })
    }

    /// 登出: 清除当前令牌并吊销
    #[instrument(skip(self))]
    pub fn logout(&self, username: &str) -> ApiResult<()> {
        let user = self.find_user(username)?;
        self.user_repo.set_current_token(&user.id, None)?;

        if let Some(token) = user.current_token {
            let now = Utc::now();
            self.revoked_repo.insert(&token, now)?;
            let purged = self.revoked_repo.purge_older_than(now - self.tokens.ttl())?;
            tracing::debug!(purged, "过期吊销记录已清理");
        }

        tracing::info!(user_id = %user.id, "登出成功");
        Ok(())
    }

    /// 更新用户（提供新密码时重新哈希）
    #[instrument(skip(self, request))]
    pub fn update_user(&self, username: &str, request: UpdateUserRequest) -> ApiResult<User> {
        let mut user = self.find_user(username)?;

        if let Some(new_username) = non_empty(request.username) {
            if new_username != user.username {
                if self.user_repo.find_by_username(&new_username)?.is_some() {
                    return Err(ApiError::Conflict("El usuario ya existe".to_string()));
                }
                user.username = new_username;
            }
        }
        if let Some(cc) = non_empty(request.cc) {
            user.cc = cc;
        }
        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            user.password_hash = self.hash_password(&password)?;
        }
        if request.first_names.is_some() {
            user.first_names = request.first_names;
        }
        if request.last_names.is_some() {
            user.last_names = request.last_names;
        }
        if request.phone.is_some() {
            user.phone = request.phone;
        }
        if request.email.is_some() {
            user.email = request.email;
        }
        if let Some(role) = request.role {
            user.role = role;
        }

        self.user_repo.update(&user)?;
        tracing::info!(user_id = %user.id, "用户更新成功");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub fn delete_user(&self, username: &str) -> ApiResult<()> {
        if !self.user_repo.delete_by_username(username)? {
            return Err(ApiError::NotFound("Usuario no encontrado".to_string()));
        }
        tracing::info!(username, "用户已删除");
        Ok(())
    }

    pub fn list_users(&self) -> ApiResult<Vec<User>> {
        Ok(self.user_repo.find_all()?)
    }

    pub fn get_user(&self, username: &str) -> ApiResult<User> {
        self.find_user(username)
    }

    /// 重置密码并投递给用户邮箱
    ///
    /// # 返回
    /// - Err(ApiError::ValidationError): 用户不存在或无邮箱（密码未改动）
    /// - Err(ApiError::InternalError): 投递失败（新密码已生效）
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, username: &str) -> ApiResult<()> {
        let mut user = self
            .user_repo
            .find_by_username(username.trim())?
            .ok_or_else(|| ApiError::ValidationError("Usuario no encontrado".to_string()))?;

        let email = user
            .email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                ApiError::ValidationError(
                    "El usuario no tiene un correo electrónico registrado".to_string(),
                )
            })?;

        let new_password = generate_password();
        user.password_hash = self.hash_password_blocking(new_password.clone()).await?;
        self.user_repo.update(&user)?;

        if let Err(e) = self.mailer.send_new_password(&email, &new_password).await {
            tracing::error!(user_id = %user.id, error = %e, "新密码邮件投递失败");
            return Err(ApiError::InternalError(
                "Error al enviar el correo electrónico.".to_string(),
            ));
        }

        tracing::info!(user_id = %user.id, "密码已重置");
        Ok(())
    }

    /// 认证请求令牌
    ///
    /// # 返回
    /// - Err(ApiError::Unauthorized): 令牌无效、过期或已吊销
    pub fn authenticate(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.tokens.verify(token)?;
        if self.revoked_repo.is_revoked(token)? {
            return Err(ApiError::Unauthorized("Token revocado".to_string()));
        }
        Ok(claims)
    }

    fn find_user(&self, username: &str) -> ApiResult<User> {
        self.user_repo
            .find_by_username(username)?
            .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))
    }

    fn hash_password(&self, password: &str) -> ApiResult<String> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| ApiError::InternalError(format!("密码哈希失败: {}", e)))
    }

    /// 在阻塞线程池中计算哈希（供异步流程使用）
    async fn hash_password_blocking(&self, password: String) -> ApiResult<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?
            .map_err(|e| ApiError::InternalError(format!("密码哈希失败: {}", e)))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// 生成随机字母数字密码
fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password_shape() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), RESET_PASSWORD_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
