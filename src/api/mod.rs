// ==========================================
// 学习成果评估系统 - API 层
// ==========================================
// 职责: 提供与 HTTP 框架无关的业务 API, 供 axum 路由调用
// ==========================================

pub mod error;
pub mod learning_outcome_api;
pub mod mailer;
pub mod program_api;
pub mod prueba_api;
pub mod prueba_view;
pub mod session;
pub mod user_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use learning_outcome_api::{
    LearningOutcomeApi, OutcomeProgramsRequest, OutcomeRequest, OutcomeWithPrograms,
};
pub use mailer::{LogMailer, PasswordResetMailer};
pub use program_api::{ProgramApi, ProgramRequest};
pub use prueba_api::{AssessmentRequest, PruebaApi, RosterImportResponse, StudentUpsertResponse};
pub use prueba_view::{AssessmentDetail, GroupDetail, StudentDetail};
pub use session::{Claims, TokenService};
pub use user_api::{LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, UserApi};
