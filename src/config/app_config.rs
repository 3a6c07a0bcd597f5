// ==========================================
// 学习成果评估系统 - 运行配置
// ==========================================
// 职责: 从环境变量加载服务配置, 缺失或非法值回退默认值
// ==========================================

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;

// ==========================================
// 环境变量键
// ==========================================
pub mod env_keys {
    pub const DB_PATH: &str = "ACADEMIC_QA_DB_PATH";
    pub const BIND: &str = "ACADEMIC_QA_BIND";
    pub const JWT_SECRET: &str = "ACADEMIC_QA_JWT_SECRET";
    pub const TOKEN_TTL_SECS: &str = "ACADEMIC_QA_TOKEN_TTL_SECS";
    pub const UPLOAD_LIMIT_BYTES: &str = "ACADEMIC_QA_UPLOAD_LIMIT_BYTES";
    pub const BCRYPT_COST: &str = "ACADEMIC_QA_BCRYPT_COST";
}

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_JWT_SECRET: &str = "jwtSecret";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// bcrypt 接受的代价范围
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// 令牌有效期上限（30 天）
pub const MAX_TOKEN_TTL_SECS: u64 = 30 * 24 * 3600;

const DB_FILE_NAME: &str = "academic_qa.db";

/// 服务配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub upload_limit_bytes: usize,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（测试可注入）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_path = value(env_keys::DB_PATH).unwrap_or_else(get_default_db_path);

        let bind_addr = parse_or_default(env_keys::BIND, value(env_keys::BIND), || {
            SocketAddr::from(([0, 0, 0, 0], 5000))
        });

        let jwt_secret = match value(env_keys::JWT_SECRET) {
            Some(secret) => secret,
            None => {
                tracing::warn!("{} 未设置, 使用默认签名密钥", env_keys::JWT_SECRET);
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let token_ttl_secs = within_or_default(
            env_keys::TOKEN_TTL_SECS,
            parse_or_default(env_keys::TOKEN_TTL_SECS, value(env_keys::TOKEN_TTL_SECS), || {
                DEFAULT_TOKEN_TTL_SECS
            }),
            1..=MAX_TOKEN_TTL_SECS,
            DEFAULT_TOKEN_TTL_SECS,
        );
        let upload_limit_bytes = parse_or_default(
            env_keys::UPLOAD_LIMIT_BYTES,
            value(env_keys::UPLOAD_LIMIT_BYTES),
            || DEFAULT_UPLOAD_LIMIT_BYTES,
        );
        let bcrypt_cost = within_or_default(
            env_keys::BCRYPT_COST,
            parse_or_default(env_keys::BCRYPT_COST, value(env_keys::BCRYPT_COST), || {
                DEFAULT_BCRYPT_COST
            }),
            MIN_BCRYPT_COST..=MAX_BCRYPT_COST,
            DEFAULT_BCRYPT_COST,
        );

        Self {
            db_path,
            bind_addr,
            jwt_secret,
            token_ttl_secs,
            upload_limit_bytes,
            bcrypt_cost,
        }
    }
}

fn parse_or_default<T, D>(key: &str, raw: Option<String>, default: D) -> T
where
    T: std::str::FromStr,
    D: FnOnce() -> T,
{
    match raw {
        Some(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "配置值非法, 使用默认值");
                default()
            }
        },
        None => default(),
    }
}

/// 超出允许范围的值回退默认值
fn within_or_default<T>(key: &str, value: T, range: RangeInclusive<T>, default: T) -> T
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        value
    } else {
        tracing::warn!(key, value = %value, "配置值超出范围, 使用默认值");
        default
    }
}

/// 获取默认数据库路径
///
/// 用户数据目录下的 academic_qa.db, 无数据目录时使用当前目录
pub fn get_default_db_path() -> String {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("academic-qa");
    if let Err(e) = std::fs::create_dir_all(&path) {
        tracing::warn!("无法创建数据目录 {}: {}", path.display(), e);
        return DB_FILE_NAME.to_string();
    }
    path.push(DB_FILE_NAME);
    path.to_string_lossy().to_string()
}
