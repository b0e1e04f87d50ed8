// ==========================================
// 销售询价跟踪系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表（幂等），动态字段以 JSON 文本存储于 enquiry.dynamic_fields
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

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

/// 建表（CREATE IF NOT EXISTS，可重复调用）
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
          version INTEGER PRIMARY KEY,
          applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
          scope_id TEXT NOT NULL DEFAULT 'global',
          key TEXT NOT NULL,
          value TEXT NOT NULL,
          updated_at TEXT NOT NULL DEFAULT (datetime('now')),
          PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS enquiry (
          id TEXT PRIMARY KEY,
          enquiry_number TEXT NOT NULL UNIQUE,
          po_number TEXT,
          market_type TEXT NOT NULL,
          product_type TEXT NOT NULL,
          supply_scope TEXT NOT NULL,
          manufacturing_type TEXT,
          enquiry_date TEXT NOT NULL,
          date_received TEXT,
          date_submitted TEXT,
          closure_date TEXT,
          drawing_status TEXT NOT NULL,
          costing_status TEXT NOT NULL,
          rnd_status TEXT NOT NULL,
          sales_status TEXT NOT NULL,
          rnd_handler_name TEXT,
          sales_rep_name TEXT,
          status TEXT NOT NULL,
          activity TEXT NOT NULL,
          days_required INTEGER NOT NULL DEFAULT 0,
          remarks TEXT NOT NULL,
          dynamic_fields TEXT NOT NULL DEFAULT '{}',
          created_by TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_enquiry_status ON enquiry(status);
        CREATE INDEX IF NOT EXISTS idx_enquiry_date ON enquiry(enquiry_date);

        CREATE TABLE IF NOT EXISTS field_definition (
          name TEXT PRIMARY KEY,
          label TEXT NOT NULL,
          field_type TEXT NOT NULL,
          options_json TEXT NOT NULL DEFAULT '[]',
          is_required INTEGER NOT NULL DEFAULT 0,
          description TEXT,
          is_active INTEGER NOT NULL DEFAULT 1,
          created_by TEXT,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS system_field (
          name TEXT PRIMARY KEY,
          label TEXT NOT NULL,
          field_type TEXT NOT NULL,
          is_active INTEGER NOT NULL DEFAULT 1,
          updated_by TEXT,
          updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
