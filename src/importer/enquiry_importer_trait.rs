// ==========================================
// 销售询价跟踪系统 - 询价导入 Trait
// ==========================================
// 职责: 定义询价导入接口（不包含实现）
// ==========================================

use crate::domain::import::{ImportOptions, ImportResult, RawRow};
use crate::importer::error::ImportOutcome;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// EnquiryImporter Trait
// ==========================================
// 用途: 询价导入主接口
// 实现者: EnquiryImporterImpl
#[async_trait]
pub trait EnquiryImporter: Send + Sync {
    /// 导入一批原始行
    ///
    /// # 参数
    /// - rows: 原始行（表头 → 单元格值）
    /// - options: 特权标志 / 自定义自然键列 / 操作人 / 取消令牌
    ///
    /// # 返回
    /// - Ok(ImportResult): 行级错误已收集在结果中
    /// - Err: 批次级错误（配置读取失败等）
    ///
    /// # 导入流程
    /// 1. 解析自然键（缺失则跳过）
    /// 2. 规范列解析 + 标准化 + 派生
    /// 3. 未占用的列 → 动态字段
    /// 4. 按自然键合并或新建
    async fn import_batch(
        &self,
        rows: Vec<RawRow>,
        options: ImportOptions,
    ) -> ImportOutcome<ImportResult>;

    /// 解析 CSV / Excel 文件后导入
    ///
    /// # 参数
    /// - file_path: .csv / .xlsx / .xls
    async fn import_file(
        &self,
        file_path: &Path,
        options: ImportOptions,
    ) -> ImportOutcome<ImportResult>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - header_row_index: 表头所在行（0 起算）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 行记录列表（已跳过空白行）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_rows(
        &self,
        file_path: &Path,
        header_row_index: usize,
    ) -> ImportOutcome<Vec<RawRow>>;
}
