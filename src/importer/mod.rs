// ==========================================
// 学习成果评估系统 - 导入层
// ==========================================
// 职责: 将上传的名单文件解析为原始行
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
