// ==========================================
// 销售询价跟踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将下层错误转换为用户友好的错误消息
// 要求: 所有错误信息必须包含显式原因
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::schema::error::SchemaError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 字段模式错误
    // ==========================================
    #[error("类型变更不安全: field={field}, 已检查 {records_examined} 条记录: {reason}")]
    UnsafeTypeChange {
        field: String,
        reason: String,
        records_examined: usize,
    },

    #[error("需要确认: 字段 {field} 被 {affected_count} 条记录使用，传入 force 后删除并清除数据")]
    ConfirmationRequired { field: String, affected_count: usize },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Serialization(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 SchemaError 转换
// ==========================================
impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::DuplicateField(name) => {
                ApiError::BusinessRuleViolation(format!("字段 {} 已存在", name))
            }
            SchemaError::InvalidDefinition(msg) => ApiError::InvalidInput(msg),
            SchemaError::ImmutableIdentity { name, attempted } => ApiError::BusinessRuleViolation(
                format!("字段名不可修改: {} -> {}", name, attempted),
            ),
            SchemaError::UnsafeTypeChange {
                field,
                reason,
                records_examined,
                ..
            } => ApiError::UnsafeTypeChange {
                field,
                reason,
                records_examined,
            },
            SchemaError::ConfirmationRequired {
                field,
                affected_count,
            } => ApiError::ConfirmationRequired {
                field,
                affected_count,
            },
            SchemaError::FieldNotFound(name) => ApiError::NotFound(format!("字段 {} 不存在", name)),
            SchemaError::Repository(err) => err.into(),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件 {} 不存在", path)),
            ImportError::UnsupportedFormat(ext) => {
                ApiError::InvalidInput(format!("不支持的文件格式: {}", ext))
            }
            ImportError::Schema(err) => err.into(),
            ImportError::Repository(err) => err.into(),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_conversion() {
        let err: ApiError = SchemaError::ConfirmationRequired {
            field: "region".to_string(),
            affected_count: 4,
        }
        .into();
        assert!(matches!(err, ApiError::ConfirmationRequired { affected_count: 4, .. }));

        let err: ApiError = SchemaError::FieldNotFound("ghost".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_import_error_conversion() {
        let err: ApiError = ImportError::CsvParse("bad quote".to_string()).into();
        assert!(matches!(err, ApiError::ImportError(msg) if msg.contains("bad quote")));

        let err: ApiError =
            ImportError::Repository(RepositoryError::LockError("poisoned".to_string())).into();
        assert!(matches!(err, ApiError::DatabaseConnectionError(_)));
    }
}
