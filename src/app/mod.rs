// ==========================================
// 销售询价跟踪系统 - 应用层
// ==========================================
// 职责: 组装仓储、字段模式引擎、导入器与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
