// ==========================================
// 销售询价跟踪系统 - 询价导入 API
// ==========================================
// 职责: 封装询价导入（原始行批次 / CSV / Excel）
// ==========================================

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::import::{ImportOptions, ImportResult, RawRow};
use crate::importer::EnquiryImporter;

/// 导入API
pub struct ImportApi {
    importer: Arc<dyn EnquiryImporter>,
}

impl ImportApi {
    pub fn new(importer: Arc<dyn EnquiryImporter>) -> Self {
        Self { importer }
    }

    /// 导入原始行批次
    pub async fn import_batch(
        &self,
        rows: Vec<RawRow>,
        options: ImportOptions,
    ) -> ApiResult<ImportResult> {
        Ok(self.importer.import_batch(rows, options).await?)
    }

    /// 导入 CSV / Excel 文件
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv / .xlsx / .xls）
    pub async fn import_file(
        &self,
        file_path: &str,
        options: ImportOptions,
    ) -> ApiResult<ImportResult> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }
        let result = self.importer.import_file(Path::new(file_path), options).await?;
        info!(
            file_path,
            created = result.created,
            updated = result.updated,
            failed = result.failed,
            "文件导入完成"
        );
        Ok(result)
    }
}
