// ==========================================
// 学习成果评估系统 - 名单导入合并
// ==========================================
// 输入: 外部表格的原始行（第一行为表头）
// 输出: 追加到分组名单的新学生条目
// ==========================================
// 规则:
// - 表头前两列（忽略大小写/首尾空白）必须为 "documento" / "nombre"
// - 数据行只追加, 不覆盖已有条目
// - 证件号已在组内（或本次文件中已出现）的行跳过
// - 缺证件号或姓名的行跳过
// 红线: 表头不合法时名单保持不变
// ==========================================

use crate::domain::assessment::{Group, RosterEntry};
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::instrument;

pub const DOCUMENT_HEADER: &str = "documento";
pub const NAME_HEADER: &str = "nombre";

/// 名单合并统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMergeSummary {
    pub imported: usize,           // 新增条目数
    pub skipped_duplicates: usize, // 证件号重复跳过数
    pub skipped_incomplete: usize, // 缺字段跳过数
}

impl RosterMergeSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_duplicates + self.skipped_incomplete
    }
}

// ==========================================
// RosterMerger - 名单合并器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct RosterMerger;

impl RosterMerger {
    pub fn new() -> Self {
        Self
    }

    /// 校验表头行
    pub fn validate_header(&self, header: &[String]) -> EngineResult<()> {
        let column = |idx: usize| {
            header
                .get(idx)
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_default()
        };

        if column(0) != DOCUMENT_HEADER || column(1) != NAME_HEADER {
            return Err(EngineError::Validation(
                "El archivo debe tener columnas \"Documento\" y \"Nombre\" en la primera fila"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// 将原始行合并进分组名单
    ///
    /// # 参数
    /// - `group`: 目标分组
    /// - `rows`: 原始行序列（首行为表头）
    ///
    /// # 返回
    /// - Ok(RosterMergeSummary): 合并统计
    /// - Err(EngineError::Validation): 文件为空或表头不合法（名单未改动）
    #[instrument(skip(self, group, rows), fields(group_id = %group.id))]
    pub fn merge_rows<I>(&self, group: &mut Group, rows: I) -> EngineResult<RosterMergeSummary>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut rows = rows.into_iter();
        let header = rows
            .next()
            .ok_or_else(|| EngineError::Validation("El archivo no contiene filas".to_string()))?;
        self.validate_header(&header)?;

        let mut seen: HashSet<String> = group.students.iter().map(|s| s.document.clone()).collect();
        let mut summary = RosterMergeSummary::default();
        let mut entries = Vec::new();

        for (idx, row) in rows.enumerate() {
            let cell = |i: usize| row.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
            let document = cell(0);
            let name = cell(1);

            if document.is_empty() || name.is_empty() {
                // 完全空白的行不计入统计
                if !(document.is_empty() && name.is_empty()) {
                    tracing::warn!(row = idx + 2, "名单行缺少证件号或姓名, 已跳过");
                    summary.skipped_incomplete += 1;
                }
                continue;
            }

            if !seen.insert(document.clone()) {
                tracing::warn!(row = idx + 2, document = %document, "证件号重复, 已跳过");
                summary.skipped_duplicates += 1;
                continue;
            }

            entries.push(RosterEntry::new(document, name));
        }

        summary.imported = entries.len();
        group.students.extend(entries);

        tracing::info!(
            imported = summary.imported,
            skipped = summary.skipped(),
            "名单合并完成"
        );
        Ok(summary)
    }
}
