// ==========================================
// 学习成果评估系统 - 引擎层
// ==========================================
// 职责: 测评聚合内的业务规则（分组/名单/成绩/平均值）
// 红线: Engine 不拼 SQL, 只操作内存中的领域对象
// ==========================================

pub mod aggregation;
pub mod error;
pub mod groups;
pub mod roster;
pub mod student;

// 重导出核心引擎
pub use aggregation::AggregationEngine;
pub use error::{EngineError, EngineResult};
pub use groups::GroupPlanner;
pub use roster::{RosterMergeSummary, RosterMerger};
pub use student::{GradeInput, StudentEditor, StudentPatch, UpsertOutcome};
