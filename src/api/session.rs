// ==========================================
// 学习成果评估系统 - 会话令牌服务
// ==========================================
// 工具: jsonwebtoken (HS256)
// 红线: 过期判断不留宽限 (leeway = 0)
// ==========================================

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::app_config::DEFAULT_TOKEN_TTL_SECS;
use crate::domain::types::new_id;

/// 令牌声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // 同一秒内多次登录也得到不同令牌
}

// ==========================================
// TokenService - 令牌签发与校验
// ==========================================
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or_else(|| {
                    tracing::warn!(ttl_secs, "令牌有效期超出范围, 使用默认值");
                    Duration::seconds(DEFAULT_TOKEN_TTL_SECS as i64)
                }),
        }
    }

    /// 令牌有效期
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 签发令牌
    pub fn issue(&self, user_id: &str) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: new_id(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::InternalError(format!("令牌签发失败: {}", e)))
    }

    /// 校验令牌签名与有效期
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("La sesión ha expirado".to_string())
                }
                _ => ApiError::Unauthorized("Token inválido".to_string()),
            })
    }
}
