// ==========================================
// 销售询价跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义询价记录、动态字段定义、导入批次等领域类型
// 红线: 不含数据访问逻辑,不含导入/模式引擎逻辑
// ==========================================

pub mod enquiry;
pub mod field;
pub mod import;
pub mod types;

// 重导出核心类型
pub use enquiry::{DynamicFields, Enquiry, EnquiryFilter};
pub use field::{
    canonicalize_field_name, is_valid_field_name, DynamicColumn, FieldDefinition, FieldPatch,
    NewFieldDefinition, SystemField,
};
pub use import::{
    ImportCancellation, ImportOptions, ImportPhase, ImportResult, RawRow, RowError, RowOutcome,
};
pub use types::{
    Activity, DepartmentStatus, DomainParseError, EnquiryStatus, FieldType, FieldValue,
    MarketSegment, ProductType, SupplyScope, SUPPLY_SCOPE_NOT_SPECIFIED,
};
