// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#![allow(dead_code)]

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use academic_qa::api::{
    AssessmentRequest, LearningOutcomeApi, OutcomeRequest, PasswordResetMailer, ProgramApi,
    ProgramRequest, PruebaApi, RegisterRequest, UserApi,
};
use academic_qa::app::AppState;
use academic_qa::config::{env_keys, AppConfig};
use academic_qa::domain::{LearningOutcome, Program, Role, User};

/// 测试用 bcrypt 成本（最低值, 加快测试）
pub const TEST_BCRYPT_COST: &str = "4";

// ==========================================
// RecordingMailer - 记录投递内容的邮件实现
// ==========================================
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasswordResetMailer for RecordingMailer {
    async fn send_new_password(&self, email: &str, new_password: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("smtp unavailable");
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), new_password.to_string()));
        Ok(())
    }
}

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例, 共享一个临时数据库
pub struct ApiTestEnv {
    pub db_path: String,
    pub state: AppState,
    pub prueba_api: Arc<PruebaApi>,
    pub program_api: Arc<ProgramApi>,
    pub outcome_api: Arc<LearningOutcomeApi>,
    pub user_api: Arc<UserApi>,
    pub mailer: Arc<RecordingMailer>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    pub fn new() -> Result<Self, String> {
        Self::with_mailer(RecordingMailer::default())
    }

    /// 使用指定邮件实现创建测试环境
    pub fn with_mailer(mailer: RecordingMailer) -> Result<Self, String> {
        Self::build(mailer, &[])
    }

    /// 使用额外配置项创建测试环境
    pub fn with_settings(settings: &[(&str, &str)]) -> Result<Self, String> {
        Self::build(RecordingMailer::default(), settings)
    }

    fn build(mailer: RecordingMailer, settings: &[(&str, &str)]) -> Result<Self, String> {
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let mut pairs: Vec<(String, String)> = vec![
            (env_keys::DB_PATH.to_string(), db_path.clone()),
            (env_keys::BCRYPT_COST.to_string(), TEST_BCRYPT_COST.to_string()),
            (env_keys::JWT_SECRET.to_string(), "test-secret".to_string()),
        ];
        pairs.extend(settings.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = AppConfig::from_lookup(|key| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        });

        let mailer = Arc::new(mailer);
        let state = AppState::with_mailer(&config, mailer.clone())?;

        Ok(Self {
            db_path,
            prueba_api: state.prueba_api.clone(),
            program_api: state.program_api.clone(),
            outcome_api: state.outcome_api.clone(),
            user_api: state.user_api.clone(),
            state,
            mailer,
            _temp_file: temp_file,
        })
    }

    // ==========================================
    // 测试数据准备
    // ==========================================

    pub fn seed_program(&self, name: &str) -> Program {
        self.program_api
            .create_program(ProgramRequest {
                faculty: "Ingeniería".to_string(),
                name: name.to_string(),
                terms: 10,
                registry_code: Some(format!("RC-{}", name)),
            })
            .expect("创建项目失败")
    }

    pub fn seed_outcome(&self, name: &str, program_id: &str) -> LearningOutcome {
        self.outcome_api
            .create_outcome(OutcomeRequest {
                name: name.to_string(),
                faculty: "Ingeniería".to_string(),
                description: format!("Descripción de {}", name),
                program_ids: vec![program_id.to_string()],
            })
            .expect("创建学习成果失败")
    }

    pub fn seed_user(&self, username: &str) -> User {
        self.user_api
            .register(RegisterRequest {
                username: username.to_string(),
                cc: format!("cc-{}", username),
                password: "secreto123".to_string(),
                first_names: Some(username.to_uppercase()),
                last_names: Some("Prueba".to_string()),
                phone: None,
                email: Some(format!("{}@example.edu", username)),
                role: Some(Role::Evaluator),
            })
            .expect("注册用户失败")
    }
}

// ==========================================
// 测评场景
// ==========================================

/// 一个项目, 两个学习成果, 两个负责人
pub struct Scenario {
    pub env: ApiTestEnv,
    pub program: Program,
    pub outcome_a: LearningOutcome,
    pub outcome_b: LearningOutcome,
    pub evaluators: Vec<User>,
}

impl Scenario {
    pub fn new() -> Self {
        let env = ApiTestEnv::new().expect("无法创建测试环境");
        let program = env.seed_program("Sistemas");
        let outcome_a = env.seed_outcome("RA1", &program.id);
        let outcome_b = env.seed_outcome("RA2", &program.id);
        let evaluators = vec![env.seed_user("eval1"), env.seed_user("eval2")];
        Self {
            env,
            program,
            outcome_a,
            outcome_b,
            evaluators,
        }
    }

    /// 两个分组的测评请求
    pub fn request(&self) -> AssessmentRequest {
        AssessmentRequest {
            name: "Parcial 1".to_string(),
            program_id: self.program.id.clone(),
            learning_outcome_ids: vec![self.outcome_a.id.clone(), self.outcome_b.id.clone()],
            semester: "2024-1".to_string(),
            description: "Primer corte".to_string(),
            group_count: 2,
            responsible_user_ids: self.evaluators.iter().map(|u| u.id.clone()).collect(),
            date: Some("2024-03-15".to_string()),
        }
    }
}
