// ==========================================
// 销售询价跟踪系统 - 询价记录仓储
// ==========================================
// 职责: 管理 enquiry 表（规范属性列 + dynamic_fields JSON 列）
// 说明: 动态字段的存在性/移除/键发现使用 SQLite JSON1 函数
// ==========================================

use crate::db::{initialize_schema, open_sqlite_connection};
use crate::domain::enquiry::{DynamicFields, Enquiry, EnquiryFilter};
use crate::domain::types::{DomainParseError, FieldValue};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::RecordStore;
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::ops::ControlFlow;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// dynamic_fields 中单个键的 JSON 路径（?1 绑定字段名）
const FIELD_PATH: &str = r#"'$."' || ?1 || '"'"#;

const SELECT_COLUMNS: &str = r#"
    id, enquiry_number, po_number, market_type, product_type, supply_scope,
    manufacturing_type, enquiry_date, date_received, date_submitted, closure_date,
    drawing_status, costing_status, rnd_status, sales_status, rnd_handler_name,
    sales_rep_name, status, activity, days_required, remarks, dynamic_fields,
    created_by, created_at, updated_at
"#;

pub struct EnquiryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnquiryRepository {
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

    fn map_row(row: &Row) -> rusqlite::Result<Enquiry> {
        let manufacturing_type: Option<String> = row.get(6)?;
        let manufacturing_type = manufacturing_type
            .map(|raw| parse_text(6, &raw))
            .transpose()?;
        let dynamic_raw: String = row.get(21)?;
        let enquiry_number: String = row.get(1)?;
        let dynamic_fields = decode_dynamic_fields(&enquiry_number, &dynamic_raw);

        Ok(Enquiry {
            id: row.get(0)?,
            enquiry_number,
            po_number: row.get(2)?,
            market_type: parse_column(row, 3)?,
            product_type: parse_column(row, 4)?,
            supply_scope: row.get(5)?,
            manufacturing_type,
            enquiry_date: row.get(7)?,
            date_received: row.get(8)?,
            date_submitted: row.get(9)?,
            closure_date: row.get(10)?,
            drawing_status: parse_column(row, 11)?,
            costing_status: parse_column(row, 12)?,
            rnd_status: parse_column(row, 13)?,
            sales_status: parse_column(row, 14)?,
            rnd_handler_name: row.get(15)?,
            sales_rep_name: row.get(16)?,
            status: parse_column(row, 17)?,
            activity: parse_column(row, 18)?,
            days_required: row.get(19)?,
            remarks: row.get(20)?,
            dynamic_fields,
            created_by: row.get(22)?,
            created_at: row.get(23)?,
            updated_at: row.get(24)?,
        })
    }
}

/// 枚举列: TEXT → FromStr
fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = DomainParseError>,
{
    let raw: String = row.get(idx)?;
    parse_text(idx, &raw)
}

fn parse_text<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = DomainParseError>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// dynamic_fields 列 → DynamicFields
///
/// 单个条目无法识别时只影响该条目，整行仍可读取
fn decode_dynamic_fields(enquiry_number: &str, raw: &str) -> DynamicFields {
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
        Ok(entries) => entries
            .into_iter()
            .filter_map(|(name, json)| {
                let value = decode_field_value(&name, json);
                if value.is_none() {
                    warn!(enquiry_number, field = %name, "动态字段值无法识别，读取时忽略");
                }
                value.map(|v| (name, v))
            })
            .collect(),
        Err(e) => {
            warn!(enquiry_number, error = %e, "dynamic_fields 不是 JSON 对象，按空处理");
            DynamicFields::new()
        }
    }
}

/// 单个动态字段 JSON → FieldValue
///
/// 本仓储写入 {"type","value"} 对象；外部写入的裸标量按原样兼容。
/// value 为 null 或非有限数时返回 None，其余无法识别的对象保留为原始 JSON 文本
fn decode_field_value(name: &str, json: serde_json::Value) -> Option<FieldValue> {
    use serde_json::Value as Json;

    match json {
        Json::Null => None,
        Json::String(s) => Some(FieldValue::Text(s)),
        Json::Bool(b) => Some(FieldValue::Bool(b)),
        Json::Number(n) => n.as_f64().map(FieldValue::Number),
        Json::Object(ref entry) if entry.get("value").is_some_and(Json::is_null) => None,
        other => match serde_json::from_value::<FieldValue>(other.clone()) {
            Ok(value) if !value.is_sentinel() => Some(value),
            Ok(_) => None,
            Err(e) => {
                debug!(field = %name, error = %e, "动态字段按原始 JSON 文本保留");
                Some(FieldValue::Text(other.to_string()))
            }
        },
    }
}

/// json_extract 结果 → FieldValue（对象以 JSON 文本返回，字符串标量不带引号）
fn field_value_from_sql(name: &str, value: Value) -> RepositoryResult<Option<FieldValue>> {
    match value {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(FieldValue::Number(i as f64))),
        Value::Real(f) => Ok(Some(FieldValue::Number(f))),
        Value::Text(s) => match serde_json::from_str::<serde_json::Value>(&s) {
            Ok(json @ serde_json::Value::Object(_)) => Ok(decode_field_value(name, json)),
            _ => Ok(Some(FieldValue::Text(s))),
        },
        Value::Blob(_) => Err(RepositoryError::FieldValueError {
            field: "dynamic_fields".to_string(),
            message: "不支持的 BLOB 值".to_string(),
        }),
    }
}

impl RecordStore for EnquiryRepository {
    fn find(&self, filter: &EnquiryFilter) -> RepositoryResult<Vec<Enquiry>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            values.push(Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", values.len()));
        }
        if let Some(activity) = filter.activity {
            values.push(Value::Text(activity.as_str().to_string()));
            conditions.push(format!("activity = ?{}", values.len()));
        }
        if let Some(market_type) = filter.market_type {
            values.push(Value::Text(market_type.as_str().to_string()));
            conditions.push(format!("market_type = ?{}", values.len()));
        }
        if let Some(start) = filter.start_date {
            values.push(Value::Text(start.format("%F").to_string()));
            conditions.push(format!("enquiry_date >= ?{}", values.len()));
        }
        if let Some(end) = filter.end_date {
            values.push(Value::Text(end.format("%F").to_string()));
            conditions.push(format!("enquiry_date <= ?{}", values.len()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            values.push(Value::Text(format!("%{}%", search.to_lowercase())));
            conditions.push(format!("LOWER(enquiry_number) LIKE ?{}", values.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM enquiry {} ORDER BY enquiry_date DESC, enquiry_number ASC",
            SELECT_COLUMNS, where_clause
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn find_one(&self, enquiry_number: &str) -> RepositoryResult<Option<Enquiry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM enquiry WHERE enquiry_number = ?1",
            SELECT_COLUMNS
        );
        let record = conn
            .query_row(&sql, params![enquiry_number], Self::map_row)
            .optional()?;
        Ok(record)
    }

    fn upsert(&self, record: &Enquiry) -> RepositoryResult<()> {
        // 哨兵值（含非有限数）不落库，serde_json 会把 ±inf 写成 null
        let stored: DynamicFields = record
            .dynamic_fields
            .iter()
            .filter(|(_, value)| !value.is_sentinel())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let dynamic_json = serde_json::to_string(&stored)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO enquiry (
                id, enquiry_number, po_number, market_type, product_type, supply_scope,
                manufacturing_type, enquiry_date, date_received, date_submitted, closure_date,
                drawing_status, costing_status, rnd_status, sales_status, rnd_handler_name,
                sales_rep_name, status, activity, days_required, remarks, dynamic_fields,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)
            ON CONFLICT(enquiry_number) DO UPDATE SET
                po_number = excluded.po_number,
                market_type = excluded.market_type,
                product_type = excluded.product_type,
                supply_scope = excluded.supply_scope,
                manufacturing_type = excluded.manufacturing_type,
                enquiry_date = excluded.enquiry_date,
                date_received = excluded.date_received,
                date_submitted = excluded.date_submitted,
                closure_date = excluded.closure_date,
                drawing_status = excluded.drawing_status,
                costing_status = excluded.costing_status,
                rnd_status = excluded.rnd_status,
                sales_status = excluded.sales_status,
                rnd_handler_name = excluded.rnd_handler_name,
                sales_rep_name = excluded.sales_rep_name,
                status = excluded.status,
                activity = excluded.activity,
                days_required = excluded.days_required,
                remarks = excluded.remarks,
                dynamic_fields = excluded.dynamic_fields,
                updated_at = excluded.updated_at
            "#,
            params![
                record.id,
                record.enquiry_number,
                record.po_number,
                record.market_type.as_str(),
                record.product_type.as_str(),
                record.supply_scope,
                record.manufacturing_type.map(|s| s.as_str()),
                record.enquiry_date,
                record.date_received,
                record.date_submitted,
                record.closure_date,
                record.drawing_status.as_str(),
                record.costing_status.as_str(),
                record.rnd_status.as_str(),
                record.sales_status.as_str(),
                record.rnd_handler_name,
                record.sales_rep_name,
                record.status.as_str(),
                record.activity.as_str(),
                record.days_required,
                record.remarks,
                dynamic_json,
                record.created_by,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM enquiry", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_with_field(&self, name: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT COUNT(*) FROM enquiry \
             WHERE COALESCE(json_type(dynamic_fields, {}), 'null') != 'null'",
            FIELD_PATH
        );
        let count: i64 = conn.query_row(&sql, params![name], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn scan_field_values(
        &self,
        name: &str,
        visitor: &mut dyn FnMut(FieldValue) -> ControlFlow<()>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT json_extract(dynamic_fields, {}) FROM enquiry \
             WHERE COALESCE(json_type(dynamic_fields, {}), 'null') != 'null' \
             ORDER BY enquiry_number",
            FIELD_PATH, FIELD_PATH
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![name])?;

        let mut visited = 0usize;
        while let Some(row) = rows.next()? {
            let raw: Value = row.get(0)?;
            let Some(value) = field_value_from_sql(name, raw)? else {
                continue;
            };
            visited += 1;
            if visitor(value).is_break() {
                debug!(field = %name, visited, "字段值扫描提前结束");
                break;
            }
        }
        Ok(visited)
    }

    fn bulk_unset_field(&self, name: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let sql = format!(
            "UPDATE enquiry SET dynamic_fields = json_remove(dynamic_fields, {}), updated_at = ?2 \
             WHERE json_type(dynamic_fields, {}) IS NOT NULL",
            FIELD_PATH, FIELD_PATH
        );
        let affected = conn.execute(&sql, params![name, Utc::now()])?;
        Ok(affected)
    }

    fn dynamic_field_keys(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT je.key FROM enquiry, json_each(enquiry.dynamic_fields) AS je \
             ORDER BY je.key",
        )?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        Activity, DepartmentStatus, EnquiryStatus, MarketSegment, ProductType,
    };
    use chrono::NaiveDate;

    fn repo() -> EnquiryRepository {
        let conn = Connection::open_in_memory().unwrap();
        EnquiryRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn record(number: &str, dynamic: &[(&str, FieldValue)]) -> Enquiry {
        let now = Utc::now();
        Enquiry {
            id: uuid::Uuid::new_v4().to_string(),
            enquiry_number: number.to_string(),
            po_number: None,
            market_type: MarketSegment::Export,
            product_type: ProductType::Nsp,
            supply_scope: "Not specified".to_string(),
            manufacturing_type: None,
            enquiry_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            date_received: NaiveDate::from_ymd_opt(2025, 3, 1),
            date_submitted: None,
            closure_date: None,
            drawing_status: DepartmentStatus::Completed,
            costing_status: DepartmentStatus::NotRequired,
            rnd_status: DepartmentStatus::NotRequired,
            sales_status: DepartmentStatus::Completed,
            rnd_handler_name: None,
            sales_rep_name: Some("Default Sales Rep".to_string()),
            status: EnquiryStatus::Open,
            activity: Activity::InProgress,
            days_required: 3,
            remarks: "No remarks".to_string(),
            dynamic_fields: dynamic
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_upsert_and_find_one_round_trip() {
        let repo = repo();
        let enquiry = record("ENQ-1", &[("region", FieldValue::text("North"))]);
        repo.upsert(&enquiry).unwrap();

        let loaded = repo.find_one("ENQ-1").unwrap().unwrap();
        assert_eq!(loaded.id, enquiry.id);
        assert_eq!(loaded.market_type, MarketSegment::Export);
        assert_eq!(loaded.dynamic_fields, enquiry.dynamic_fields);
        assert!(repo.find_one("ENQ-404").unwrap().is_none());
    }

    #[test]
    fn test_upsert_keeps_original_id() {
        let repo = repo();
        let first = record("ENQ-1", &[]);
        repo.upsert(&first).unwrap();

        let mut second = record("ENQ-1", &[]);
        second.activity = Activity::Quoted;
        repo.upsert(&second).unwrap();

        let loaded = repo.find_one("ENQ-1").unwrap().unwrap();
        assert_eq!(loaded.id, first.id);
        assert_eq!(loaded.activity, Activity::Quoted);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_field_presence_scan_and_unset() {
        let repo = repo();
        repo.upsert(&record("ENQ-1", &[("plant", FieldValue::text("A"))])).unwrap();
        repo.upsert(&record("ENQ-2", &[("plant", FieldValue::Number(2.0))])).unwrap();
        repo.upsert(&record("ENQ-3", &[("other", FieldValue::Bool(true))])).unwrap();

        assert_eq!(repo.count_with_field("plant").unwrap(), 2);

        let mut seen = Vec::new();
        let visited = repo
            .scan_field_values("plant", &mut |v| {
                seen.push(v);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(visited, 2);
        assert_eq!(seen[0], FieldValue::text("A"));
        assert_eq!(seen[1], FieldValue::Number(2.0));

        let stopped = repo
            .scan_field_values("plant", &mut |_| ControlFlow::Break(()))
            .unwrap();
        assert_eq!(stopped, 1);

        assert_eq!(
            repo.dynamic_field_keys().unwrap(),
            vec!["other".to_string(), "plant".to_string()]
        );

        assert_eq!(repo.bulk_unset_field("plant").unwrap(), 2);
        assert_eq!(repo.count_with_field("plant").unwrap(), 0);
        assert_eq!(repo.dynamic_field_keys().unwrap(), vec!["other".to_string()]);
    }

    #[test]
    fn test_non_finite_number_is_not_stored() {
        let repo = repo();
        let enquiry = record(
            "ENQ-1",
            &[
                ("weight", FieldValue::Number(f64::INFINITY)),
                ("region", FieldValue::text("North")),
            ],
        );
        repo.upsert(&enquiry).unwrap();

        let loaded = repo.find_one("ENQ-1").unwrap().unwrap();
        assert!(!loaded.dynamic_fields.contains_key("weight"));
        assert_eq!(loaded.dynamic_fields.get("region"), Some(&FieldValue::text("North")));
        assert_eq!(repo.count_with_field("weight").unwrap(), 0);
    }

    #[test]
    fn test_unreadable_dynamic_entry_does_not_block_row() {
        let repo = repo();
        repo.upsert(&record("ENQ-1", &[])).unwrap();
        repo.upsert(&record("ENQ-2", &[])).unwrap();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                r#"UPDATE enquiry SET dynamic_fields = '{"weight":{"type":"number","value":null},"legacy":{"type":"blob","value":1},"plant":"P1"}' WHERE enquiry_number = 'ENQ-1'"#,
                [],
            )
            .unwrap();
        }

        let loaded = repo.find_one("ENQ-1").unwrap().unwrap();
        assert!(!loaded.dynamic_fields.contains_key("weight"));
        assert_eq!(loaded.dynamic_fields.get("plant"), Some(&FieldValue::text("P1")));
        assert!(matches!(
            loaded.dynamic_fields.get("legacy"),
            Some(FieldValue::Text(raw)) if raw.contains("blob")
        ));
        assert_eq!(repo.find(&EnquiryFilter::default()).unwrap().len(), 2);

        // 扫描跳过 null 值，不计数
        let visited = repo
            .scan_field_values("weight", &mut |_| ControlFlow::Continue(()))
            .unwrap();
        assert_eq!(visited, 0);

        // 读取后可再次写回
        repo.upsert(&loaded).unwrap();
        assert_eq!(repo.dynamic_field_keys().unwrap(), vec!["legacy", "plant"]);
    }

    #[test]
    fn test_find_with_filter() {
        let repo = repo();
        let mut closed = record("ENQ-10", &[]);
        closed.status = EnquiryStatus::Closed;
        repo.upsert(&closed).unwrap();
        repo.upsert(&record("ENQ-11", &[])).unwrap();

        let filter = EnquiryFilter {
            status: Some(EnquiryStatus::Closed),
            ..Default::default()
        };
        let found = repo.find(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].enquiry_number, "ENQ-10");

        let search = EnquiryFilter {
            search: Some("enq-1".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.find(&search).unwrap().len(), 2);
    }
}
