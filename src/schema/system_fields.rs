// ==========================================
// 销售询价跟踪系统 - 系统字段注册表
// ==========================================
// 职责: 规范列的展示标签（可改名、可隐藏）
// 说明: 规范列为强类型列，停用只影响展示，不清除记录中的值
// ==========================================

use crate::domain::field::SystemField;
use crate::domain::types::FieldType;
use crate::repository::system_field_repo::SystemFieldRepository;
use crate::schema::error::{SchemaError, SchemaResult};
use std::sync::Arc;
use tracing::info;

/// 默认系统字段: (name, label, type)
const DEFAULT_SYSTEM_FIELDS: [(&str, &str, FieldType); 20] = [
    ("enquiry_number", "Enquiry #", FieldType::Text),
    ("po_number", "PO Number", FieldType::Text),
    ("enquiry_date", "Enquiry Date", FieldType::Date),
    ("date_received", "Date Received", FieldType::Date),
    ("date_submitted", "Date Submitted", FieldType::Date),
    ("market_type", "Market", FieldType::Text),
    ("product_type", "Product", FieldType::Text),
    ("supply_scope", "Supply Scope", FieldType::Text),
    ("manufacturing_type", "Manufacturing", FieldType::Text),
    ("drawing_status", "Drawing", FieldType::Text),
    ("costing_status", "Costing", FieldType::Text),
    ("rnd_status", "R&D", FieldType::Text),
    ("sales_status", "Sales", FieldType::Text),
    ("activity", "Activity", FieldType::Text),
    ("status", "Status", FieldType::Text),
    ("sales_rep_name", "Sales Rep", FieldType::Text),
    ("rnd_handler_name", "R&D Handler", FieldType::Text),
    ("days_required", "Days Required", FieldType::Number),
    ("closure_date", "Closure Date", FieldType::Date),
    ("remarks", "Remarks", FieldType::Text),
];

fn default_field(name: &str) -> Option<SystemField> {
    DEFAULT_SYSTEM_FIELDS
        .iter()
        .find(|(default_name, _, _)| *default_name == name)
        .map(|(name, label, field_type)| SystemField {
            name: name.to_string(),
            label: label.to_string(),
            field_type: *field_type,
            active: true,
            updated_by: None,
        })
}

pub fn default_system_fields() -> Vec<SystemField> {
    DEFAULT_SYSTEM_FIELDS
        .iter()
        .filter_map(|(name, _, _)| default_field(name))
        .collect()
}

pub struct SystemFieldRegistry {
    repo: Arc<SystemFieldRepository>,
}

impl SystemFieldRegistry {
    pub fn new(repo: Arc<SystemFieldRepository>) -> Self {
        Self { repo }
    }

    /// 补齐缺失的默认系统字段（不覆盖已改名的标签），返回新增数
    pub fn ensure_defaults(&self) -> SchemaResult<usize> {
        let inserted = self.repo.insert_missing(&default_system_fields())?;
        if inserted > 0 {
            info!(inserted, "默认系统字段已补齐");
        }
        Ok(inserted)
    }

    /// 按名称排序列出（含停用）
    pub fn list(&self) -> SchemaResult<Vec<SystemField>> {
        self.ensure_defaults()?;
        Ok(self.repo.list()?)
    }

    pub fn relabel(&self, name: &str, label: &str, actor: Option<&str>) -> SchemaResult<SystemField> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SchemaError::InvalidDefinition("系统字段标签不能为空".to_string()));
        }
        self.known(name)?;
        self.ensure_defaults()?;
        self.repo.update_label(name, label, actor)?;
        info!(name, label, "系统字段已改名");
        self.fetch(name)
    }

    pub fn deactivate(&self, name: &str, actor: Option<&str>) -> SchemaResult<SystemField> {
        self.known(name)?;
        self.ensure_defaults()?;
        self.repo.set_active(name, false, actor)?;
        info!(name, "系统字段已停用");
        self.fetch(name)
    }

    fn known(&self, name: &str) -> SchemaResult<()> {
        default_field(name)
            .map(|_| ())
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))
    }

    fn fetch(&self, name: &str) -> SchemaResult<SystemField> {
        self.repo
            .find_by_name(name)?
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))
    }
}
