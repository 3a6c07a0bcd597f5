// ==========================================
// 学习成果评估系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("Formato de archivo no soportado: {0} (solo .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("No se pudo leer el archivo: {0}")]
    FileReadError(String),

    #[error("El archivo está vacío")]
    EmptyFile,

    #[error("Error al procesar el archivo Excel: {0}")]
    ExcelParseError(String),

    #[error("Error al procesar el archivo CSV: {0}")]
    CsvParseError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
