// ==========================================
// 销售询价跟踪系统 - 字段定义领域模型
// ==========================================
// 职责: 用户自定义动态字段 / 系统字段的数据结构
// 红线: name 为不可变身份标识
// ==========================================

use crate::domain::types::FieldType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// FieldDefinition - 动态字段定义
// ==========================================
// 对齐: field_definition 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,               // 身份标识（小写字母/数字/下划线，不可变）
    pub label: String,              // 展示名称
    pub field_type: FieldType,      // 字段类型
    pub options: Vec<String>,       // select 可选值（有序）
    pub required: bool,             // 是否必填（仅提示，引擎不强制）
    pub description: Option<String>,
    pub active: bool,               // 软删除标志
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建字段请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFieldDefinition {
    pub name: String,
    pub label: String,
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    pub created_by: Option<String>,
}

impl NewFieldDefinition {
    /// 导入时自动创建的文本字段
    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type: Some(FieldType::Text),
            ..Default::default()
        }
    }
}

/// 字段更新补丁（None 表示不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub label: Option<String>,
    pub field_type: Option<FieldType>,
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.label.is_none()
            && self.field_type.is_none()
            && self.options.is_none()
            && self.required.is_none()
            && self.description.is_none()
            && self.active.is_none()
    }
}

// ==========================================
// DynamicColumn - 动态列视图
// ==========================================
// 用途: 列表/导出时展示动态列，包含无字段定义的孤儿键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicColumn {
    pub name: String,
    pub label: String,
    pub definition: Option<FieldDefinition>,
}

impl DynamicColumn {
    pub fn is_orphan(&self) -> bool {
        self.definition.is_none()
    }
}

// ==========================================
// SystemField - 系统（规范）字段标签
// ==========================================
// 对齐: system_field 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemField {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub active: bool,
    pub updated_by: Option<String>,
}

/// 规范化字段名（trim + 小写）
pub fn canonicalize_field_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 字段名只允许小写字母、数字、下划线
pub fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
