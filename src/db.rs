// ==========================================
// 学习成果评估系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 幂等建表, 记录 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS program (
    id            TEXT PRIMARY KEY,
    faculty       TEXT NOT NULL,
    name          TEXT NOT NULL,
    terms         INTEGER NOT NULL,
    registry_code TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS learning_outcome (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    faculty     TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS learning_outcome_program (
    outcome_id TEXT NOT NULL REFERENCES learning_outcome(id) ON DELETE CASCADE,
    program_id TEXT NOT NULL REFERENCES program(id) ON DELETE CASCADE,
    position   INTEGER NOT NULL,
    PRIMARY KEY (outcome_id, program_id)
);

CREATE TABLE IF NOT EXISTS app_user (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    cc            TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    first_names   TEXT,
    last_names    TEXT,
    phone         TEXT,
    email         TEXT,
    role          TEXT NOT NULL,
    current_token TEXT
);

CREATE TABLE IF NOT EXISTS revoked_token (
    token      TEXT PRIMARY KEY,
    revoked_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS prueba (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    program_id TEXT NOT NULL,
    document   TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS schema_version (
    version    INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等建表并写入 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    match read_schema_version(conn)? {
        Some(v) if v >= CURRENT_SCHEMA_VERSION => {}
        Some(v) => {
            tracing::warn!(found = v, expected = CURRENT_SCHEMA_VERSION, "数据库 schema_version 较旧");
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
        }
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
