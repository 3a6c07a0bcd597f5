// ==========================================
// 学习成果评估系统 - 已吊销令牌仓储
// ==========================================
// 职责: 登出后的令牌黑名单
// 时间: revoked_at 以 RFC3339 (UTC) 存储, 字典序即时间序
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// RevokedTokenRepository
// ==========================================
pub struct RevokedTokenRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RevokedTokenRepository {
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 吊销令牌（重复吊销不报错）
    pub fn insert(&self, token: &str, revoked_at: DateTime<Utc>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO revoked_token (token, revoked_at) VALUES (?1, ?2)",
            params![token, to_db_time(revoked_at)],
        )?;
        Ok(())
    }

    pub fn is_revoked(&self, token: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM revoked_token WHERE token = ?1",
                params![token],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 清理早于截止时间的记录
    ///
    /// # 返回
    /// 被删除的记录数
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let purged = conn.execute(
            "DELETE FROM revoked_token WHERE revoked_at < ?1",
            params![to_db_time(cutoff)],
        )?;
        Ok(purged)
    }
}

fn to_db_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
