// ==========================================
// 学习成果评估系统 - 教学项目仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::program::Program;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "SELECT id, faculty, name, terms, registry_code FROM program";

// ==========================================
// ProgramRepository - 教学项目仓储
// ==========================================
/// 职责: 管理 program 表的 CRUD 操作
pub struct ProgramRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgramRepository {
    /// 创建新的 ProgramRepository 实例
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

    pub fn create(&self, program: &Program) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO program (id, faculty, name, terms, registry_code) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                program.id,
                program.faculty,
                program.name,
                program.terms,
                program.registry_code,
            ],
        )?;
        Ok(())
    }

    pub fn find_all(&self) -> RepositoryResult<Vec<Program>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at ASC, rowid ASC", SELECT_COLUMNS))?;
        let programs = stmt
            .query_map([], map_program)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(programs)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Program>> {
        let conn = self.get_conn()?;
        let program = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                map_program,
            )
            .optional()?;
        Ok(program)
    }

    /// 批量按ID查询（不存在的ID被忽略, 结果顺序不保证）
    pub fn find_by_ids(&self, ids: &[String]) -> RepositoryResult<Vec<Program>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!("{} WHERE id IN ({})", SELECT_COLUMNS, placeholders))?;
        let programs = stmt
            .query_map(params_from_iter(ids.iter()), map_program)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(programs)
    }

    /// 按 (名称, 注册编码) 查询，用于唯一性检查
    pub fn find_by_name_and_code(
        &self,
        name: &str,
        registry_code: Option<&str>,
    ) -> RepositoryResult<Option<Program>> {
        let conn = self.get_conn()?;
        let program = conn
            .query_row(
                &format!("{} WHERE name = ?1 AND registry_code IS ?2", SELECT_COLUMNS),
                params![name, registry_code],
                map_program,
            )
            .optional()?;
        Ok(program)
    }

    /// 更新项目
    ///
    /// # 返回
    /// - Err(RepositoryError::NotFound): 项目不存在
    pub fn update(&self, program: &Program) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE program SET faculty = ?2, name = ?3, terms = ?4, registry_code = ?5 WHERE id = ?1",
            params![
                program.id,
                program.faculty,
                program.name,
                program.terms,
                program.registry_code,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Programa", &program.id));
        }
        Ok(())
    }

    pub fn delete_by_id(&self, id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM program WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

fn map_program(row: &Row<'_>) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        faculty: row.get(1)?,
        name: row.get(2)?,
        terms: row.get(3)?,
        registry_code: row.get(4)?,
    })
}
