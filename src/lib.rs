// ==========================================
// 学习成果评估系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 学术项目/学习成果/测评成绩管理后端
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 名单文件解析
pub mod importer;

// 配置层 - 环境配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/表结构）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{Assessment, Group, LearningOutcome, Program, RosterEntry, User};

// 引擎
pub use engine::{AggregationEngine, GroupPlanner, RosterMerger, StudentEditor};

// API
pub use api::{LearningOutcomeApi, ProgramApi, PruebaApi, UserApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学习成果评估系统";
