// ==========================================
// 销售询价跟踪系统 - 字段定义 Store Trait
// ==========================================
// 职责: 定义动态字段定义的数据访问接口（不包含实现）
// 红线: 不做名称校验/类型安全检查，由 FieldRegistry 负责
// ==========================================

use crate::domain::field::FieldDefinition;
use crate::repository::error::RepositoryResult;

// ==========================================
// FieldDefinitionStore Trait
// ==========================================
// 实现者: FieldDefinitionRepository（使用 rusqlite）
pub trait FieldDefinitionStore: Send + Sync {
    /// 插入新定义（name 重复时返回 UniqueConstraintViolation）
    fn insert(&self, definition: &FieldDefinition) -> RepositoryResult<()>;

    fn find_by_name(&self, name: &str) -> RepositoryResult<Option<FieldDefinition>>;

    /// 整体更新除 name / created_* 之外的属性（单条 UPDATE）
    fn update(&self, definition: &FieldDefinition) -> RepositoryResult<()>;

    /// 物理删除，返回是否存在
    fn delete(&self, name: &str) -> RepositoryResult<bool>;

    /// 按名称排序列出定义
    fn list(&self, include_inactive: bool) -> RepositoryResult<Vec<FieldDefinition>>;
}
