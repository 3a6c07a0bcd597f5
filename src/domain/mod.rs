// ==========================================
// 学习成果评估系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assessment;
pub mod learning_outcome;
pub mod program;
pub mod types;
pub mod user;

// 重导出核心类型
pub use assessment::{Assessment, Grade, Group, OutcomeAverage, RosterEntry};
pub use learning_outcome::LearningOutcome;
pub use program::Program;
pub use types::Role;
pub use user::User;
