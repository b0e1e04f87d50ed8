// ==========================================
// 销售询价跟踪系统 - 字段定义仓储
// ==========================================
// 职责: 管理 field_definition 表
// 说明: options 以 JSON 数组文本存储（保持顺序）
// ==========================================

use crate::db::{initialize_schema, open_sqlite_connection};
use crate::domain::field::FieldDefinition;
use crate::domain::types::FieldType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::field_definition_store::FieldDefinitionStore;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "name, label, field_type, options_json, is_required, description, \
                              is_active, created_by, created_at, updated_at";

pub struct FieldDefinitionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FieldDefinitionRepository {
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

    fn map_row(row: &Row) -> rusqlite::Result<FieldDefinition> {
        let field_type_raw: String = row.get(2)?;
        let field_type = field_type_raw
            .parse::<FieldType>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        let options_raw: String = row.get(3)?;
        let options: Vec<String> = serde_json::from_str(&options_raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(FieldDefinition {
            name: row.get(0)?,
            label: row.get(1)?,
            field_type,
            options,
            required: row.get(4)?,
            description: row.get(5)?,
            active: row.get(6)?,
            created_by: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FieldDefinitionStore for FieldDefinitionRepository {
    fn insert(&self, definition: &FieldDefinition) -> RepositoryResult<()> {
        let options_json = serde_json::to_string(&definition.options)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO field_definition (
                name, label, field_type, options_json, is_required, description,
                is_active, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                definition.name,
                definition.label,
                definition.field_type.as_str(),
                options_json,
                definition.required,
                definition.description,
                definition.active,
                definition.created_by,
                definition.created_at,
                definition.updated_at,
            ],
        )?;
        Ok(())
    }

    fn find_by_name(&self, name: &str) -> RepositoryResult<Option<FieldDefinition>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM field_definition WHERE name = ?1", SELECT_COLUMNS);
        let definition = conn
            .query_row(&sql, params![name], Self::map_row)
            .optional()?;
        Ok(definition)
    }

    fn update(&self, definition: &FieldDefinition) -> RepositoryResult<()> {
        let options_json = serde_json::to_string(&definition.options)?;
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE field_definition SET
                label = ?2,
                field_type = ?3,
                options_json = ?4,
                is_required = ?5,
                description = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE name = ?1
            "#,
            params![
                definition.name,
                definition.label,
                definition.field_type.as_str(),
                options_json,
                definition.required,
                definition.description,
                definition.active,
                definition.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "FieldDefinition".to_string(),
                id: definition.name.clone(),
            });
        }
        Ok(())
    }

    fn delete(&self, name: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM field_definition WHERE name = ?1", params![name])?;
        Ok(affected > 0)
    }

    fn list(&self, include_inactive: bool) -> RepositoryResult<Vec<FieldDefinition>> {
        let conn = self.get_conn()?;
        let sql = if include_inactive {
            format!("SELECT {} FROM field_definition ORDER BY name", SELECT_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM field_definition WHERE is_active = 1 ORDER BY name",
                SELECT_COLUMNS
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let definitions = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn definition(name: &str, field_type: FieldType, options: &[&str]) -> FieldDefinition {
        let now = Utc::now();
        FieldDefinition {
            name: name.to_string(),
            label: name.to_uppercase(),
            field_type,
            options: options.iter().map(|s| s.to_string()).collect(),
            required: false,
            description: None,
            active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn repo() -> FieldDefinitionRepository {
        let conn = Connection::open_in_memory().unwrap();
        FieldDefinitionRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_insert_find_and_duplicate() {
        let repo = repo();
        let def = definition("grade", FieldType::Select, &["B", "A"]);
        repo.insert(&def).unwrap();

        let loaded = repo.find_by_name("grade").unwrap().unwrap();
        assert_eq!(loaded.options, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(loaded.field_type, FieldType::Select);

        let dup = repo.insert(&def);
        assert!(matches!(dup, Err(RepositoryError::UniqueConstraintViolation(_))));
    }

    #[test]
    fn test_list_hides_inactive() {
        let repo = repo();
        repo.insert(&definition("alpha", FieldType::Text, &[])).unwrap();
        let mut beta = definition("beta", FieldType::Number, &[]);
        repo.insert(&beta).unwrap();
        beta.active = false;
        repo.update(&beta).unwrap();

        assert_eq!(repo.list(false).unwrap().len(), 1);
        assert_eq!(repo.list(true).unwrap().len(), 2);
    }

    #[test]
    fn test_update_and_delete_missing() {
        let repo = repo();
        let ghost = definition("ghost", FieldType::Text, &[]);
        assert!(matches!(
            repo.update(&ghost),
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(!repo.delete("ghost").unwrap());
    }
}
