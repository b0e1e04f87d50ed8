// ==========================================
// 销售询价跟踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行入口调用
// ==========================================

pub mod enquiry_api;
pub mod error;
pub mod field_api;
pub mod import_api;

// 重导出核心类型
pub use enquiry_api::EnquiryApi;
pub use error::{ApiError, ApiResult};
pub use field_api::{DeleteFieldResponse, FieldApi};
pub use import_api::ImportApi;
