// ==========================================
// 学习成果评估系统 - 配置层
// ==========================================
// 职责: 服务运行配置（环境变量 + 默认值）
// ==========================================

pub mod app_config;

// 重导出核心配置
pub use app_config::{env_keys, get_default_db_path, AppConfig};
