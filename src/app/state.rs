// ==========================================
// 学习成果评估系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 红线: 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    LearningOutcomeApi, LogMailer, PasswordResetMailer, ProgramApi, PruebaApi, TokenService,
    UserApi,
};
use crate::config::AppConfig;
use crate::repository::{
    AssessmentRepositoryImpl, LearningOutcomeRepository, ProgramRepository,
    RevokedTokenRepository, UserRepository,
};

/// 应用状态
///
/// 包含所有API实例, 由 axum 在各个请求间克隆共享
#[derive(Clone)]
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 测评API
    pub prueba_api: Arc<PruebaApi>,

    /// 学术项目API
    pub program_api: Arc<ProgramApi>,

    /// 学习成果API
    pub outcome_api: Arc<LearningOutcomeApi>,

    /// 用户与会话API
    pub user_api: Arc<UserApi>,

    /// 上传文件大小上限（字节）
    pub upload_limit_bytes: usize,
}

impl AppState {
    /// 使用默认邮件投递（仅记录日志）创建AppState
    pub fn new(config: &AppConfig) -> Result<Self, String> {
        Self::with_mailer(config, Arc::new(LogMailer))
    }

    /// 创建AppState
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并确保表结构存在
    /// 2. 初始化所有Repository（共享连接）
    /// 3. 创建所有API实例
    pub fn with_mailer(
        config: &AppConfig,
        mailer: Arc<dyn PasswordResetMailer>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", config.db_path);

        let conn = crate::db::open_sqlite_connection(&config.db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::ensure_schema(&conn).map_err(|e| format!("无法初始化表结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let prueba_repo = Arc::new(AssessmentRepositoryImpl::from_connection(conn.clone()));
        let program_repo = Arc::new(ProgramRepository::from_connection(conn.clone()));
        let outcome_repo = Arc::new(LearningOutcomeRepository::from_connection(conn.clone()));
        let user_repo = Arc::new(UserRepository::from_connection(conn.clone()));
        let revoked_repo = Arc::new(RevokedTokenRepository::from_connection(conn));

        // ==========================================
        // 创建API层
        // ==========================================
        let prueba_api = Arc::new(PruebaApi::new(
            prueba_repo,
            program_repo.clone(),
            outcome_repo.clone(),
            user_repo.clone(),
        ));
        let program_api = Arc::new(ProgramApi::new(program_repo.clone()));
        let outcome_api = Arc::new(LearningOutcomeApi::new(outcome_repo, program_repo));
        let user_api = Arc::new(UserApi::new(
            user_repo,
            revoked_repo,
            TokenService::new(&config.jwt_secret, config.token_ttl_secs),
            mailer,
            config.bcrypt_cost,
        ));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path: config.db_path.clone(),
            prueba_api,
            program_api,
            outcome_api,
            user_api,
            upload_limit_bytes: config.upload_limit_bytes,
        })
    }
}
