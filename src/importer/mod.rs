// ==========================================
// 销售询价跟踪系统 - 导入层
// ==========================================
// 职责: 外部表格数据导入为询价记录
// 支持: Excel, CSV, 原始行批次
// ==========================================

// 模块声明
pub mod column_resolver;
pub mod enquiry_importer_impl;
pub mod enquiry_importer_trait;
pub mod error;
pub mod field_name;
pub mod file_parser;
pub mod value_normalizer;

// 重导出核心类型
pub use column_resolver::{
    CanonicalField, CaseInsensitiveTier, ColumnResolver, ExactTier, MatchTier, NormalizedTier,
    TieredColumnResolver,
};
pub use enquiry_importer_impl::EnquiryImporterImpl;
pub use error::{ImportError, ImportOutcome};
pub use field_name::derive_field_name;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use value_normalizer::{DefaultValueNormalizer, EnumKind, NormalizedEnum, ValueNormalizer};

// 重导出 Trait 接口
pub use enquiry_importer_trait::{EnquiryImporter, FileParser};
