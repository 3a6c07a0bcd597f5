// ==========================================
// 学习成果评估系统 - 应用层
// ==========================================
// 职责: HTTP 集成, 连接客户端与业务 API
// ==========================================

pub mod routes;
pub mod state;

// 重导出
pub use routes::build_router;
pub use state::AppState;
