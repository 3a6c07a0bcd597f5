// ==========================================
// 学习成果评估系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod learning_outcome_repo;
pub mod program_repo;
pub mod prueba_repo;
pub mod prueba_repo_impl;
pub mod revoked_token_repo;
pub mod user_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use learning_outcome_repo::LearningOutcomeRepository;
pub use program_repo::ProgramRepository;
pub use prueba_repo::AssessmentRepository;
pub use prueba_repo_impl::AssessmentRepositoryImpl;
pub use revoked_token_repo::RevokedTokenRepository;
pub use user_repo::UserRepository;
