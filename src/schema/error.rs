// ==========================================
// 销售询价跟踪系统 - 字段模式引擎错误类型
// ==========================================
// 工具: thiserror
// 用途: FieldRegistry / TypeSafetyScanner / SystemFieldRegistry
// ==========================================

use crate::domain::types::FieldType;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("字段已存在: {0}")]
    DuplicateField(String),

    #[error("字段定义无效: {0}")]
    InvalidDefinition(String),

    #[error("字段名不可修改: {name} -> {attempted}")]
    ImmutableIdentity { name: String, attempted: String },

    #[error("字段 {field} 类型不可变更为 {target}: {reason}（已检查 {records_examined} 条记录）")]
    UnsafeTypeChange {
        field: String,
        target: FieldType,
        reason: String,
        records_examined: usize,
    },

    #[error("字段 {field} 仍被 {affected_count} 条记录引用，需要确认后强制删除")]
    ConfirmationRequired { field: String, affected_count: usize },

    #[error("字段不存在: {0}")]
    FieldNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type SchemaResult<T> = Result<T, SchemaError>;
