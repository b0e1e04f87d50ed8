// ==========================================
// 销售询价跟踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod enquiry_repo;
pub mod error;
pub mod field_definition_repo;
pub mod field_definition_store;
pub mod record_store;
pub mod system_field_repo;

// 重导出核心仓储
pub use enquiry_repo::EnquiryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use field_definition_repo::FieldDefinitionRepository;
pub use field_definition_store::FieldDefinitionStore;
pub use record_store::RecordStore;
pub use system_field_repo::SystemFieldRepository;
