// ==========================================
// 销售询价跟踪系统 - 字段模式引擎
// ==========================================
// 职责: 动态字段定义注册表 / 类型安全扫描 / 系统字段标签
// 依赖: repository 层（RecordStore / FieldDefinitionStore）
// ==========================================

pub mod error;
pub mod field_registry;
pub mod system_fields;
pub mod type_safety_scanner;

pub use error::{SchemaError, SchemaResult};
pub use field_registry::FieldRegistry;
pub use system_fields::{default_system_fields, SystemFieldRegistry};
pub use type_safety_scanner::{is_value_compatible, ScanReport, TypeSafetyScanner};
