// ==========================================
// 学习成果评估系统 - 用户仓储
// ==========================================
// 红线: Repository 不含业务逻辑（密码哈希由 API 层完成）
// ==========================================

use crate::domain::types::Role;
use crate::domain::user::User;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, username, cc, password_hash, first_names, last_names,
           phone, email, role, current_token
    FROM app_user
"#;

// ==========================================
// UserRepository - 用户仓储
// ==========================================
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    /// 创建新的 UserRepository 实例
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

    /// 创建用户
    ///
    /// # 返回
    /// - Err(RepositoryError::UniqueConstraintViolation): 用户名已存在
    pub fn create(&self, user: &User) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO app_user (
                id, username, cc, password_hash, first_names, last_names,
                phone, email, role, current_token
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                user.id,
                user.username,
                user.cc,
                user.password_hash,
                user.first_names,
                user.last_names,
                user.phone,
                user.email,
                user.role.to_db_str(),
                user.current_token,
            ],
        )?;
        Ok(())
    }

    pub fn find_all(&self) -> RepositoryResult<Vec<User>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY rowid ASC", SELECT_COLUMNS))?;
        let users = stmt
            .query_map([], map_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        self.find_one("id", id)
    }

    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        self.find_one("username", username)
    }

    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.find_one("email", email)
    }

    /// 批量按ID查询（不存在的ID被忽略, 结果顺序不保证）
    pub fn find_by_ids(&self, ids: &[String]) -> RepositoryResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!("{} WHERE id IN ({})", SELECT_COLUMNS, placeholders))?;
        let users = stmt
            .query_map(params_from_iter(ids.iter()), map_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// 更新用户全部字段
    ///
    /// # 返回
    /// - Err(RepositoryError::NotFound): 用户不存在
    pub fn update(&self, user: &User) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE app_user
            SET username = ?2, cc = ?3, password_hash = ?4, first_names = ?5,
                last_names = ?6, phone = ?7, email = ?8, role = ?9, current_token = ?10
            WHERE id = ?1
            "#,
            params![
                user.id,
                user.username,
                user.cc,
                user.password_hash,
                user.first_names,
                user.last_names,
                user.phone,
                user.email,
                user.role.to_db_str(),
                user.current_token,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Usuario", &user.id));
        }
        Ok(())
    }

    /// 设置当前会话令牌（None 表示登出）
    pub fn set_current_token(&self, id: &str, token: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE app_user SET current_token = ?2 WHERE id = ?1",
            params![id, token],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Usuario", id));
        }
        Ok(())
    }

    pub fn delete_by_username(&self, username: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM app_user WHERE username = ?1", params![username])?;
        Ok(deleted > 0)
    }

    fn find_one(&self, column: &'static str, value: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let user = conn
            .query_row(
                &format!("{} WHERE {} = ?1 LIMIT 1", SELECT_COLUMNS, column),
                params![value],
                map_user,
            )
            .optional()?;
        Ok(user)
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        cc: row.get(2)?,
        password_hash: row.get(3)?,
        first_names: row.get(4)?,
        last_names: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        role: Role::from_str(&row.get::<_, String>(8)?),
        current_token: row.get(9)?,
    })
}
