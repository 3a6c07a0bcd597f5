// ==========================================
// 学习成果评估系统 - 测评 Repository 实现
// ==========================================
// 职责: 测评聚合持久化（rusqlite, 每行一个 JSON 文档）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::assessment::Assessment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::prueba_repo::AssessmentRepository;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// AssessmentRepositoryImpl
// ==========================================
pub struct AssessmentRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl AssessmentRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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
}

impl AssessmentRepository for AssessmentRepositoryImpl {
    fn find_all(&self) -> RepositoryResult<Vec<Assessment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT document FROM prueba ORDER BY created_at ASC, rowid ASC")?;

        let documents = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        documents
            .iter()
            .map(|doc| serde_json::from_str(doc).map_err(RepositoryError::from))
            .collect()
    }

    fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Assessment>> {
        let conn = self.get_conn()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM prueba WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    fn create(&self, assessment: &Assessment) -> RepositoryResult<()> {
        let document = serde_json::to_string(assessment)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO prueba (id, name, program_id, document) VALUES (?1, ?2, ?3, ?4)",
            params![assessment.id, assessment.name, assessment.program_id, document],
        )?;
        Ok(())
    }

    fn save(&self, assessment: &Assessment) -> RepositoryResult<()> {
        let document = serde_json::to_string(assessment)?;
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE prueba
            SET name = ?2, program_id = ?3, document = ?4, updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![assessment.id, assessment.name, assessment.program_id, document],
        )?;

        if updated == 0 {
            return Err(RepositoryError::not_found("Prueba", &assessment.id));
        }
        Ok(())
    }

    fn delete_by_id(&self, id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM prueba WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::{Grade, Group, RosterEntry};

    fn repo() -> AssessmentRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        AssessmentRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn assessment(id: &str) -> Assessment {
        let mut group = Group::new(0, "U1".to_string());
        let mut entry = RosterEntry::new("123".to_string(), "Ana".to_string());
        entry.grades.push(Grade::new("RA1".to_string(), 4.5));
        group.students.push(entry);

        Assessment {
            id: id.to_string(),
            name: "Prueba".to_string(),
            program_id: "PR1".to_string(),
            outcome_ids: vec!["RA1".to_string()],
            description: String::new(),
            groups: vec![group],
            average: 0.0,
            semester: "2024-1".to_string(),
            date: "2024-05-01".to_string(),
        }
    }

    #[test]
    fn test_create_and_find_roundtrip_preserves_aggregate() {
        let repo = repo();
        let p = assessment("P1");
        repo.create(&p).unwrap();

        let loaded = repo.find_by_id("P1").unwrap().unwrap();
        assert_eq!(loaded, p);
        assert!(repo.find_by_id("P2").unwrap().is_none());
        assert_eq!(repo.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_save_replaces_aggregate() {
        let repo = repo();
        let mut p = assessment("P1");
        repo.create(&p).unwrap();

        p.groups.clear();
        p.name = "Renombrada".to_string();
        repo.save(&p).unwrap();

        let loaded = repo.find_by_id("P1").unwrap().unwrap();
        assert!(loaded.groups.is_empty());
        assert_eq!(loaded.name, "Renombrada");
    }

    #[test]
    fn test_save_missing_returns_not_found() {
        let repo = repo();
        let err = repo.save(&assessment("NOPE")).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_delete_by_id() {
        let repo = repo();
        repo.create(&assessment("P1")).unwrap();
        assert!(repo.delete_by_id("P1").unwrap());
        assert!(!repo.delete_by_id("P1").unwrap());
    }
}
