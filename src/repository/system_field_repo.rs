// ==========================================
// 销售询价跟踪系统 - 系统字段仓储
// ==========================================
// 职责: 管理 system_field 表（规范列的展示标签与启用状态）
// ==========================================

use crate::db::{initialize_schema, open_sqlite_connection};
use crate::domain::field::SystemField;
use crate::domain::types::FieldType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct SystemFieldRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SystemFieldRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        initialize_schema(&conn)?;
        Ok(())
    }

    fn map_row(row: &Row) -> rusqlite::Result<SystemField> {
        let field_type_raw: String = row.get(2)?;
        let field_type = field_type_raw
            .parse::<FieldType>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        Ok(SystemField {
            name: row.get(0)?,
            label: row.get(1)?,
            field_type,
            active: row.get(3)?,
            updated_by: row.get(4)?,
        })
    }

    /// 写入缺失的默认系统字段（已存在的保持不变），返回新增数
    pub fn insert_missing(&self, defaults: &[SystemField]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        for field in defaults {
            inserted += tx.execute(
                r#"
                INSERT OR IGNORE INTO system_field (name, label, field_type, is_active, updated_by)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    field.name,
                    field.label,
                    field.field_type.as_str(),
                    field.active,
                    field.updated_by,
                ],
            )?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn list(&self) -> RepositoryResult<Vec<SystemField>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT name, label, field_type, is_active, updated_by FROM system_field ORDER BY name",
        )?;
        let fields = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fields)
    }

    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<SystemField>> {
        let conn = self.get_conn()?;
        let field = conn
            .query_row(
                "SELECT name, label, field_type, is_active, updated_by FROM system_field WHERE name = ?1",
                params![name],
                Self::map_row,
            )
            .optional()?;
        Ok(field)
    }

    pub fn update_label(&self, name: &str, label: &str, actor: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE system_field SET label = ?2, updated_by = ?3, updated_at = datetime('now') WHERE name = ?1",
            params![name, label, actor],
        )?;
        Self::ensure_affected(affected, name)
    }

    pub fn set_active(&self, name: &str, active: bool, actor: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE system_field SET is_active = ?2, updated_by = ?3, updated_at = datetime('now') WHERE name = ?1",
            params![name, active, actor],
        )?;
        Self::ensure_affected(affected, name)
    }

    fn ensure_affected(affected: usize, name: &str) -> RepositoryResult<()> {
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SystemField".to_string(),
                id: name.to_string(),
            });
        }
        Ok(())
    }
}
