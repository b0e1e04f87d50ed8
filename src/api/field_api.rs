// ==========================================
// 销售询价跟踪系统 - 字段 API
// ==========================================
// 职责: 动态字段定义与系统字段标签的管理入口
// 说明: 两阶段删除的确认要求以响应体返回，而非错误
// ==========================================

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::field::{DynamicColumn, FieldDefinition, FieldPatch, NewFieldDefinition, SystemField};
use crate::schema::error::SchemaError;
use crate::schema::field_registry::FieldRegistry;
use crate::schema::system_fields::SystemFieldRegistry;

/// 删除字段响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteFieldResponse {
    /// 定义是否已删除
    pub deleted: bool,
    /// 是否需要 force 确认
    pub requires_force: bool,
    /// 引用该字段的记录数
    pub affected_count: usize,
}

// ==========================================
// FieldApi - 字段 API
// ==========================================
pub struct FieldApi {
    registry: Arc<FieldRegistry>,
    system_fields: Arc<SystemFieldRegistry>,
}

impl FieldApi {
    pub fn new(registry: Arc<FieldRegistry>, system_fields: Arc<SystemFieldRegistry>) -> Self {
        Self {
            registry,
            system_fields,
        }
    }

    // ==========================================
    // 动态字段
    // ==========================================

    pub fn create_field(&self, request: NewFieldDefinition) -> ApiResult<FieldDefinition> {
        Ok(self.registry.create(request)?)
    }

    /// 组合更新（label / type / options / required / active / description）
    pub fn update_field(&self, name: &str, patch: FieldPatch) -> ApiResult<FieldDefinition> {
        if patch.is_empty() {
            return Err(ApiError::InvalidInput("未提供任何需要更新的属性".to_string()));
        }
        Ok(self.registry.update(name, patch)?)
    }

    /// 删除字段
    ///
    /// # 返回
    /// - requires_force = true: 字段仍被引用且未确认，未做任何修改
    /// - deleted = true: 定义已删除（force 时记录中的值已清除）
    pub fn delete_field(&self, name: &str, force: bool) -> ApiResult<DeleteFieldResponse> {
        match self.registry.delete(name, force) {
            Ok(affected_count) => {
                info!(field = name, affected_count, force, "字段删除完成");
                Ok(DeleteFieldResponse {
                    deleted: true,
                    requires_force: false,
                    affected_count,
                })
            }
            Err(SchemaError::ConfirmationRequired { affected_count, .. }) => {
                debug!(field = name, affected_count, "字段删除需要确认");
                Ok(DeleteFieldResponse {
                    deleted: false,
                    requires_force: true,
                    affected_count,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_field(&self, name: &str) -> ApiResult<FieldDefinition> {
        self.registry
            .get(name)?
            .ok_or_else(|| ApiError::NotFound(format!("字段 {} 不存在", name)))
    }

    pub fn list_fields(&self, include_inactive: bool) -> ApiResult<Vec<FieldDefinition>> {
        let fields = if include_inactive {
            self.registry.list_all()?
        } else {
            self.registry.list_active()?
        };
        Ok(fields)
    }

    /// 动态列（含孤儿键）
    pub fn list_columns(&self) -> ApiResult<Vec<DynamicColumn>> {
        Ok(self.registry.list_columns()?)
    }

    // ==========================================
    // 系统字段
    // ==========================================

    pub fn list_system_fields(&self) -> ApiResult<Vec<SystemField>> {
        Ok(self.system_fields.list()?)
    }

    pub fn relabel_system_field(
        &self,
        name: &str,
        label: &str,
        actor: Option<&str>,
    ) -> ApiResult<SystemField> {
        Ok(self.system_fields.relabel(name, label, actor)?)
    }

    pub fn deactivate_system_field(&self, name: &str, actor: Option<&str>) -> ApiResult<SystemField> {
        Ok(self.system_fields.deactivate(name, actor)?)
    }
}
