// ==========================================
// 学习成果评估系统 - 名单文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 第一个工作表的原始行（含表头, 单元格已去首尾空白）
// 红线: 解析层不解释列含义, 表头校验由 RosterMerger 负责
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    /// 将上传文件内容解析为原始行
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<Vec<String>>>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<Vec<String>>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头作为第一行返回
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser {
    legacy: bool, // true: .xls, false: .xlsx
}

impl ExcelParser {
    pub fn xlsx() -> Self {
        Self { legacy: false }
    }

    pub fn xls() -> Self {
        Self { legacy: true }
    }
}

impl FileParser for ExcelParser {
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<Vec<String>>> {
        let cursor = Cursor::new(bytes);

        let range = if self.legacy {
            let mut workbook =
                Xls::new(cursor).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
            first_sheet(&mut workbook)?
        } else {
            let mut workbook =
                Xlsx::new(cursor).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
            first_sheet(&mut workbook)?
        };

        Ok(range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

/// 单元格转文本
///
/// 整数值的浮点单元格（证件号常以数字存储）输出为不带小数点的形式
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

/// 读取第一个工作表
fn first_sheet<RS, R>(workbook: &mut R) -> ImportResult<Range<Data>>
where
    R: Reader<RS>,
    RS: std::io::Read + std::io::Seek,
    R::Error: std::fmt::Display,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::ExcelParseError("El libro no tiene hojas".to_string()))?;

    workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    /// 按上传文件名的扩展名选择解析器
    ///
    /// # 参数
    /// - `file_name`: 上传时的原始文件名
    /// - `bytes`: 文件内容
    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> ImportResult<Vec<Vec<String>>> {
        if bytes.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let rows = match ext.as_str() {
            "csv" => CsvParser.parse_rows(bytes)?,
            "xlsx" => ExcelParser::xlsx().parse_rows(bytes)?,
            "xls" => ExcelParser::xls().parse_rows(bytes)?,
            _ => return Err(ImportError::UnsupportedFormat(file_name.to_string())),
        };

        tracing::debug!(file_name, rows = rows.len(), "名单文件解析完成");
        Ok(rows)
    }
}
