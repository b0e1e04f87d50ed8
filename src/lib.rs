// ==========================================
// 销售询价跟踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 动态字段模式引擎 + 容错表格导入管道
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 字段模式引擎 - 动态字段定义与类型安全
pub mod schema;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    Activity, DepartmentStatus, EnquiryStatus, FieldType, FieldValue, MarketSegment,
    ProductType, SupplyScope,
};

// 领域实体
pub use domain::{
    DynamicColumn, Enquiry, EnquiryFilter, FieldDefinition, FieldPatch, ImportCancellation,
    ImportOptions, ImportResult, NewFieldDefinition, RawRow, RowError, SystemField,
};

// 字段模式引擎
pub use schema::{FieldRegistry, SchemaError, SystemFieldRegistry, TypeSafetyScanner};

// 导入器
pub use importer::{EnquiryImporter, EnquiryImporterImpl, ImportError};

// API
pub use api::{ApiError, DeleteFieldResponse, EnquiryApi, FieldApi, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "销售询价跟踪系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
