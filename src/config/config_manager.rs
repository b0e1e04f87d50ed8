// ==========================================
// 销售询价跟踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_HEADER_ROW_INDEX, DEFAULT_MAX_FIELD_NAME_LENGTH,
    DEFAULT_SALES_REP,
};
use crate::db::{configure_sqlite_connection, initialize_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            initialize_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let snapshot = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(snapshot)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置，格式错误时告警并回退默认值
    fn get_usize_or_default(&self, key: &str, default: usize) -> RepositoryResult<usize> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<usize>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn max_field_name_length(&self) -> RepositoryResult<usize> {
        let value = self.get_usize_or_default(
            config_keys::IMPORT_MAX_FIELD_NAME_LENGTH,
            DEFAULT_MAX_FIELD_NAME_LENGTH,
        )?;
        if value == 0 {
            return Ok(DEFAULT_MAX_FIELD_NAME_LENGTH);
        }
        Ok(value)
    }

    fn default_sales_rep(&self) -> RepositoryResult<String> {
        let value = self.get_config_or_default(config_keys::IMPORT_DEFAULT_SALES_REP, DEFAULT_SALES_REP)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(DEFAULT_SALES_REP.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    fn header_row_index(&self) -> RepositoryResult<usize> {
        self.get_usize_or_default(config_keys::IMPORT_HEADER_ROW_INDEX, DEFAULT_HEADER_ROW_INDEX)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入管道
    pub const IMPORT_MAX_FIELD_NAME_LENGTH: &str = "import.max_field_name_length";
    pub const IMPORT_DEFAULT_SALES_REP: &str = "import.default_sales_rep";
    pub const IMPORT_HEADER_ROW_INDEX: &str = "import.header_row_index";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = manager();
        assert_eq!(config.max_field_name_length().unwrap(), 50);
        assert_eq!(config.default_sales_rep().unwrap(), "Default Sales Rep");
        assert_eq!(config.header_row_index().unwrap(), 0);
    }

    #[test]
    fn test_override_and_bad_value_fallback() {
        let config = manager();
        config
            .set_global_config_value(config_keys::IMPORT_HEADER_ROW_INDEX, "1")
            .unwrap();
        config
            .set_global_config_value(config_keys::IMPORT_MAX_FIELD_NAME_LENGTH, "abc")
            .unwrap();
        config
            .set_global_config_value(config_keys::IMPORT_DEFAULT_SALES_REP, "  Ravi ")
            .unwrap();

        assert_eq!(config.header_row_index().unwrap(), 1);
        assert_eq!(config.max_field_name_length().unwrap(), 50);
        assert_eq!(config.default_sales_rep().unwrap(), "Ravi");
        assert_eq!(config.get_config_snapshot().unwrap().len(), 3);
    }
}
