// ==========================================
// 学习成果评估系统 - 学习成果仓储
// ==========================================
// 表: learning_outcome + learning_outcome_program（关联顺序由 position 保持）
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::learning_outcome::LearningOutcome;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "SELECT id, name, faculty, description FROM learning_outcome";

// ==========================================
// LearningOutcomeRepository - 学习成果仓储
// ==========================================
pub struct LearningOutcomeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LearningOutcomeRepository {
    /// 创建新的 LearningOutcomeRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建学习成果及其项目关联（同一事务）
    pub fn create(&self, outcome: &LearningOutcome) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO learning_outcome (id, name, faculty, description) VALUES (?1, ?2, ?3, ?4)",
            params![outcome.id, outcome.name, outcome.faculty, outcome.description],
        )?;
        replace_links_tx(&tx, &outcome.id, &outcome.program_ids)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    pub fn find_all(&self) -> RepositoryResult<Vec<LearningOutcome>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at ASC, rowid ASC", SELECT_COLUMNS))?;
        let outcomes = stmt
            .query_map([], map_outcome)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        with_program_ids(&conn, outcomes)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<LearningOutcome>> {
        let conn = self.get_conn()?;
        let outcome = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                map_outcome,
            )
            .optional()?;

        match outcome {
            Some(outcome) => Ok(with_program_ids(&conn, vec![outcome])?.pop()),
            None => Ok(None),
        }
    }

    /// 批量按ID查询（不存在的ID被忽略, 结果顺序不保证）
    pub fn find_by_ids(&self, ids: &[String]) -> RepositoryResult<Vec<LearningOutcome>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!("{} WHERE id IN ({})", SELECT_COLUMNS, placeholders))?;
        let outcomes = stmt
            .query_map(params_from_iter(ids.iter()), map_outcome)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        with_program_ids(&conn, outcomes)
    }

    /// 查询关联到某项目的学习成果
    pub fn find_by_program(&self, program_id: &str) -> RepositoryResult<Vec<LearningOutcome>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT o.id, o.name, o.faculty, o.description
            FROM learning_outcome o
            JOIN learning_outcome_program lp ON lp.outcome_id = o.id
            WHERE lp.program_id = ?1
            ORDER BY o.created_at ASC, o.rowid ASC
            "#,
        )?;
        let outcomes = stmt
            .query_map(params![program_id], map_outcome)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        with_program_ids(&conn, outcomes)
    }

    /// 更新学习成果及其项目关联（关联整体替换）
    ///
    /// # 返回
    /// - Err(RepositoryError::NotFound): 学习成果不存在
    pub fn update(&self, outcome: &LearningOutcome) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let updated = tx.execute(
            "UPDATE learning_outcome SET name = ?2, faculty = ?3, description = ?4 WHERE id = ?1",
            params![outcome.id, outcome.name, outcome.faculty, outcome.description],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Resultado de aprendizaje", &outcome.id));
        }
        replace_links_tx(&tx, &outcome.id, &outcome.program_ids)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    pub fn delete_by_id(&self, id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM learning_outcome WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

fn map_outcome(row: &Row<'_>) -> rusqlite::Result<LearningOutcome> {
    Ok(LearningOutcome {
        id: row.get(0)?,
        name: row.get(1)?,
        faculty: row.get(2)?,
        description: row.get(3)?,
        program_ids: Vec::new(),
    })
}

fn replace_links_tx(tx: &Transaction, outcome_id: &str, program_ids: &[String]) -> RepositoryResult<()> {
    tx.execute(
        "DELETE FROM learning_outcome_program WHERE outcome_id = ?1",
        params![outcome_id],
    )?;

    let mut stmt = tx.prepare(
        "INSERT INTO learning_outcome_program (outcome_id, program_id, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, program_id) in program_ids.iter().enumerate() {
        stmt.execute(params![outcome_id, program_id, position as i64])?;
    }
    Ok(())
}

/// 补齐关联项目ID
fn with_program_ids(
    conn: &Connection,
    mut outcomes: Vec<LearningOutcome>,
) -> RepositoryResult<Vec<LearningOutcome>> {
    let mut stmt = conn.prepare(
        "SELECT program_id FROM learning_outcome_program WHERE outcome_id = ?1 ORDER BY position ASC",
    )?;
    for outcome in outcomes.iter_mut() {
        outcome.program_ids = stmt
            .query_map(params![outcome.id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
    }
    Ok(outcomes)
}
