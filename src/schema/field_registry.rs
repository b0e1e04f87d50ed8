// ==========================================
// 销售询价跟踪系统 - 动态字段注册表
// ==========================================
// 职责: 动态字段定义的生命周期（创建/修改/类型变更/两阶段删除）
// 红线: name 不可修改；类型变更先扫描后提交；所有变更与导入写入串行执行
// ==========================================

use crate::domain::field::{
    canonicalize_field_name, is_valid_field_name, DynamicColumn, FieldDefinition, FieldPatch,
    NewFieldDefinition,
};
use crate::domain::types::FieldType;
use crate::repository::error::RepositoryError;
use crate::repository::field_definition_store::FieldDefinitionStore;
use crate::repository::record_store::RecordStore;
use crate::schema::error::{SchemaError, SchemaResult};
use crate::schema::type_safety_scanner::TypeSafetyScanner;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

/// 可选项清洗: trim 后丢弃空值，保持原有顺序
fn clean_options(options: Vec<String>) -> Vec<String> {
    options
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

fn clean_label(label: &str) -> SchemaResult<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(SchemaError::InvalidDefinition("字段标签不能为空".to_string()));
    }
    Ok(label.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

// ==========================================
// FieldRegistry
// ==========================================
pub struct FieldRegistry {
    definitions: Arc<dyn FieldDefinitionStore>,
    records: Arc<dyn RecordStore>,
    scanner: TypeSafetyScanner,
    mutation_lock: Mutex<()>,
}

impl FieldRegistry {
    pub fn new(definitions: Arc<dyn FieldDefinitionStore>, records: Arc<dyn RecordStore>) -> Self {
        let scanner = TypeSafetyScanner::new(records.clone());
        Self {
            definitions,
            records,
            scanner,
            mutation_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> SchemaResult<MutexGuard<'_, ()>> {
        self.mutation_lock
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()).into())
    }

    /// 记录写入闸门
    ///
    /// 与注册表变更共用同一把锁。持有期间不会发生扫描、类型提交或批量移除，
    /// 扫描通过后到类型落库之间不会有记录写入
    pub fn record_write_guard(&self) -> SchemaResult<MutexGuard<'_, ()>> {
        self.lock()
    }

    fn require(&self, name: &str) -> SchemaResult<FieldDefinition> {
        self.definitions
            .find_by_name(name)?
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 声明新字段
    ///
    /// # 规则
    /// - name 先 trim + 小写，再校验字符集
    /// - 未指定类型时为 text
    /// - select 必须带非空可选项
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub fn create(&self, request: NewFieldDefinition) -> SchemaResult<FieldDefinition> {
        let _guard = self.lock()?;
        self.insert_locked(request)
    }

    /// 插入定义（调用方已持有 mutation_lock）
    fn insert_locked(&self, request: NewFieldDefinition) -> SchemaResult<FieldDefinition> {
        let name = canonicalize_field_name(&request.name);
        if !is_valid_field_name(&name) {
            return Err(SchemaError::InvalidDefinition(format!(
                "字段名只允许小写字母、数字和下划线: '{}'",
                request.name
            )));
        }
        let label = clean_label(&request.label)?;
        let field_type = request.field_type.unwrap_or(FieldType::Text);
        let options = clean_options(request.options);
        if field_type == FieldType::Select && options.is_empty() {
            return Err(SchemaError::InvalidDefinition(format!(
                "select 字段 {} 需要非空的可选项",
                name
            )));
        }
        if self.definitions.find_by_name(&name)?.is_some() {
            return Err(SchemaError::DuplicateField(name));
        }

        let now = Utc::now();
        let definition = FieldDefinition {
            name,
            label,
            field_type,
            options,
            required: request.required,
            description: clean_description(request.description),
            active: true,
            created_by: request.created_by,
            created_at: now,
            updated_at: now,
        };
        self.definitions.insert(&definition).map_err(|e| match e {
            RepositoryError::UniqueConstraintViolation(_) => {
                SchemaError::DuplicateField(definition.name.clone())
            }
            other => other.into(),
        })?;

        info!(name = %definition.name, field_type = %definition.field_type, "字段已创建");
        Ok(definition)
    }

    /// 获取或创建 text 字段（特权导入自动建字段）
    ///
    /// # 返回
    /// - (定义, 是否新建)；已存在的定义（含停用）原样返回
    pub fn ensure_field(
        &self,
        name: &str,
        label: &str,
        actor: Option<&str>,
    ) -> SchemaResult<(FieldDefinition, bool)> {
        let _guard = self.lock()?;
        if let Some(existing) = self.definitions.find_by_name(&canonicalize_field_name(name))? {
            return Ok((existing, false));
        }
        let mut request = NewFieldDefinition::text(name, label);
        request.created_by = actor.map(str::to_string);
        let definition = self.insert_locked(request)?;
        Ok((definition, true))
    }

    // ==========================================
    // 修改
    // ==========================================

    /// 组合更新（单次写入）
    ///
    /// # 规则
    /// - patch.name 与当前不同 → ImmutableIdentity
    /// - 类型变化时先扫描存量值，扫描选项优先取 patch.options
    /// - 仅修改可选项不触发扫描
    #[instrument(skip(self, patch))]
    pub fn update(&self, name: &str, patch: FieldPatch) -> SchemaResult<FieldDefinition> {
        let _guard = self.lock()?;
        let name = canonicalize_field_name(name);
        let current = self.require(&name)?;

        if let Some(attempted) = patch.name.as_deref() {
            if attempted.trim() != current.name {
                return Err(SchemaError::ImmutableIdentity {
                    name: current.name,
                    attempted: attempted.to_string(),
                });
            }
        }

        let mut next = current.clone();
        if let Some(label) = patch.label.as_deref() {
            next.label = clean_label(label)?;
        }
        if let Some(options) = patch.options {
            next.options = clean_options(options);
        }

        if let Some(target) = patch.field_type.filter(|t| *t != current.field_type) {
            let report = self.scanner.scan(&current.name, target, &next.options)?;
            if !report.safe {
                warn!(
                    field = %current.name,
                    from = %current.field_type,
                    to = %target,
                    examined = report.records_examined,
                    "类型变更被拒绝"
                );
                return Err(SchemaError::UnsafeTypeChange {
                    field: current.name,
                    target,
                    reason: report.reason.unwrap_or_default(),
                    records_examined: report.records_examined,
                });
            }
            next.field_type = target;
        }

        if next.field_type == FieldType::Select && next.options.is_empty() {
            return Err(SchemaError::InvalidDefinition(format!(
                "select 字段 {} 需要非空的可选项",
                next.name
            )));
        }

        if let Some(required) = patch.required {
            next.required = required;
        }
        if patch.description.is_some() {
            next.description = clean_description(patch.description);
        }
        if let Some(active) = patch.active {
            next.active = active;
        }
        next.updated_at = Utc::now();

        self.definitions.update(&next)?;
        info!(field = %next.name, field_type = %next.field_type, "字段已更新");
        Ok(next)
    }

    /// 字段名为不可变标识，任何不同的新名称都会被拒绝
    pub fn rename(&self, name: &str, new_name: &str) -> SchemaResult<FieldDefinition> {
        self.update(
            name,
            FieldPatch {
                name: Some(new_name.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn relabel(&self, name: &str, label: &str) -> SchemaResult<FieldDefinition> {
        self.update(
            name,
            FieldPatch {
                label: Some(label.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn update_options(&self, name: &str, options: Vec<String>) -> SchemaResult<FieldDefinition> {
        self.update(
            name,
            FieldPatch {
                options: Some(options),
                ..Default::default()
            },
        )
    }

    pub fn update_required(&self, name: &str, required: bool) -> SchemaResult<FieldDefinition> {
        self.update(
            name,
            FieldPatch {
                required: Some(required),
                ..Default::default()
            },
        )
    }

    /// 停用/启用（软删除，存量值保留）
    pub fn update_active(&self, name: &str, active: bool) -> SchemaResult<FieldDefinition> {
        self.update(
            name,
            FieldPatch {
                active: Some(active),
                ..Default::default()
            },
        )
    }

    /// None 清空描述
    pub fn update_description(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> SchemaResult<FieldDefinition> {
        self.update(
            name,
            FieldPatch {
                description: Some(description.unwrap_or_default().to_string()),
                ..Default::default()
            },
        )
    }

    /// 变更类型（new_options 为 None 时沿用当前可选项）
    pub fn change_type(
        &self,
        name: &str,
        new_type: FieldType,
        new_options: Option<Vec<String>>,
    ) -> SchemaResult<FieldDefinition> {
        self.update(
            name,
            FieldPatch {
                field_type: Some(new_type),
                options: new_options,
                ..Default::default()
            },
        )
    }

    // ==========================================
    // 删除（两阶段）
    // ==========================================

    /// 物理删除字段定义
    ///
    /// # 规则
    /// - 统计 dynamic_fields[name] 非空的记录数 N
    /// - N > 0 且未 force → ConfirmationRequired，不做任何修改
    /// - force → 先从所有记录移除该键，再删除定义
    ///
    /// # 返回
    /// - 受影响的记录数 N
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str, force: bool) -> SchemaResult<usize> {
        let _guard = self.lock()?;
        let name = canonicalize_field_name(name);
        let definition = self.require(&name)?;

        let affected = self.records.count_with_field(&definition.name)?;
        if affected > 0 && !force {
            return Err(SchemaError::ConfirmationRequired {
                field: definition.name,
                affected_count: affected,
            });
        }
        if affected > 0 {
            let unset = self.records.bulk_unset_field(&definition.name)?;
            warn!(field = %definition.name, records = unset, "强制删除: 已从记录中移除字段值");
        }
        self.definitions.delete(&definition.name)?;
        info!(field = %definition.name, affected, "字段已删除");
        Ok(affected)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get(&self, name: &str) -> SchemaResult<Option<FieldDefinition>> {
        Ok(self.definitions.find_by_name(&canonicalize_field_name(name))?)
    }

    pub fn list_active(&self) -> SchemaResult<Vec<FieldDefinition>> {
        Ok(self.definitions.list(false)?)
    }

    pub fn list_all(&self) -> SchemaResult<Vec<FieldDefinition>> {
        Ok(self.definitions.list(true)?)
    }

    /// 动态列视图: 启用的定义 + 记录中出现但没有任何定义的孤儿键
    pub fn list_columns(&self) -> SchemaResult<Vec<DynamicColumn>> {
        let all = self.definitions.list(true)?;
        let defined: BTreeSet<&str> = all.iter().map(|d| d.name.as_str()).collect();

        let orphans: Vec<DynamicColumn> = self
            .records
            .dynamic_field_keys()?
            .into_iter()
            .filter(|key| !defined.contains(key.as_str()))
            .map(|key| DynamicColumn {
                label: key.clone(),
                name: key,
                definition: None,
            })
            .collect();

        let mut columns: Vec<DynamicColumn> = all
            .iter()
            .filter(|d| d.active)
            .map(|d| DynamicColumn {
                name: d.name.clone(),
                label: d.label.clone(),
                definition: Some(d.clone()),
            })
            .collect();
        columns.extend(orphans);
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{EnquiryRepository, FieldDefinitionRepository};
    use rusqlite::Connection;

    fn registry() -> FieldRegistry {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let definitions = FieldDefinitionRepository::from_connection(conn.clone()).unwrap();
        let records = EnquiryRepository::from_connection(conn).unwrap();
        FieldRegistry::new(Arc::new(definitions), Arc::new(records))
    }

    #[test]
    fn test_type_change_waits_for_record_writes() {
        use std::sync::mpsc;
        use std::time::Duration;

        let registry = Arc::new(registry());
        registry
            .create(NewFieldDefinition::text("plant", "Plant"))
            .unwrap();

        let write_guard = registry.record_write_guard().unwrap();
        let (done_tx, done_rx) = mpsc::channel();
        let worker = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let result = registry.change_type("plant", FieldType::Number, None);
                done_tx.send(result.is_ok()).unwrap();
            })
        };

        // 写入闸门持有期间，类型变更无法开始扫描
        assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(registry.get("plant").unwrap().unwrap().field_type, FieldType::Text);

        drop(write_guard);
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap());
        worker.join().unwrap();
        assert_eq!(registry.get("plant").unwrap().unwrap().field_type, FieldType::Number);
    }

    #[test]
    fn test_create_canonicalizes_and_defaults_to_text() {
        let registry = registry();
        let definition = registry
            .create(NewFieldDefinition {
                name: "  Region_Code ".to_string(),
                label: " Region ".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(definition.name, "region_code");
        assert_eq!(definition.label, "Region");
        assert_eq!(definition.field_type, FieldType::Text);
        assert!(definition.active);
    }

    #[test]
    fn test_create_rejects_invalid_definitions() {
        let registry = registry();
        let bad_name = registry.create(NewFieldDefinition::text("plant site", "Plant"));
        assert!(matches!(bad_name, Err(SchemaError::InvalidDefinition(_))));

        let no_label = registry.create(NewFieldDefinition::text("plant", "  "));
        assert!(matches!(no_label, Err(SchemaError::InvalidDefinition(_))));

        let select = registry.create(NewFieldDefinition {
            name: "grade".to_string(),
            label: "Grade".to_string(),
            field_type: Some(FieldType::Select),
            options: vec![" ".to_string()],
            ..Default::default()
        });
        assert!(matches!(select, Err(SchemaError::InvalidDefinition(_))));
    }

    #[test]
    fn test_create_duplicate() {
        let registry = registry();
        registry.create(NewFieldDefinition::text("plant", "Plant")).unwrap();
        let again = registry.create(NewFieldDefinition::text("PLANT", "Plant 2"));
        assert!(matches!(again, Err(SchemaError::DuplicateField(name)) if name == "plant"));
    }

    #[test]
    fn test_rename_is_rejected_but_same_name_passes() {
        let registry = registry();
        registry.create(NewFieldDefinition::text("plant", "Plant")).unwrap();

        let err = registry.rename("plant", "site").unwrap_err();
        assert!(matches!(err, SchemaError::ImmutableIdentity { .. }));
        assert!(registry.rename("plant", "plant").is_ok());
    }

    #[test]
    fn test_update_options_on_select_requires_values() {
        let registry = registry();
        registry
            .create(NewFieldDefinition {
                name: "grade".to_string(),
                label: "Grade".to_string(),
                field_type: Some(FieldType::Select),
                options: vec!["A".to_string(), "B".to_string()],
                ..Default::default()
            })
            .unwrap();

        let err = registry.update_options("grade", Vec::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition(_)));

        let updated = registry
            .update_options("grade", vec!["A".to_string(), " C ".to_string()])
            .unwrap();
        assert_eq!(updated.options, vec!["A", "C"]);
    }

    #[test]
    fn test_ensure_field_reuses_existing() {
        let registry = registry();
        let (first, created) = registry.ensure_field("plant", "Plant", Some("importer")).unwrap();
        assert!(created);
        assert_eq!(first.created_by.as_deref(), Some("importer"));

        let (second, created) = registry.ensure_field("plant", "Other", None).unwrap();
        assert!(!created);
        assert_eq!(second.label, "Plant");
    }

    #[test]
    fn test_update_active_hides_from_active_listing() {
        let registry = registry();
        registry.create(NewFieldDefinition::text("plant", "Plant")).unwrap();
        registry.update_active("plant", false).unwrap();

        assert!(registry.list_active().unwrap().is_empty());
        assert_eq!(registry.list_all().unwrap().len(), 1);
        assert!(registry.list_columns().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_field() {
        let registry = registry();
        let err = registry.delete("ghost", true).unwrap_err();
        assert!(matches!(err, SchemaError::FieldNotFound(_)));
    }
}
