// ==========================================
// 销售询价跟踪系统 - 导入领域模型
// ==========================================
// 职责: 导入批次输入（原始行 + 选项）与导入结果
// 红线: 导入结果只在内存中构建一次，不落库
// ==========================================

use crate::domain::types::FieldValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 原始行: 表头 → 单元格值（保留表格列顺序）
pub type RawRow = IndexMap<String, FieldValue>;

// ==========================================
// ImportCancellation - 导入取消令牌
// ==========================================
// 调用方持有克隆，置位后导入循环在下一行开始前退出
#[derive(Debug, Clone, Default)]
pub struct ImportCancellation {
    flag: Arc<AtomicBool>,
}

impl ImportCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ==========================================
// ImportOptions - 导入选项
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// 特权批次: 允许自动创建动态字段定义
    pub privileged: bool,
    /// 自定义自然键列（None 时使用询价号别名）
    pub natural_key_column: Option<String>,
    /// 操作人（写入 created_by）
    pub requested_by: Option<String>,
    pub cancellation: ImportCancellation,
}

impl ImportOptions {
    pub fn privileged() -> Self {
        Self {
            privileged: true,
            ..Default::default()
        }
    }

    pub fn with_natural_key(mut self, column: impl Into<String>) -> Self {
        self.natural_key_column = Some(column.into());
        self
    }

    pub fn with_requested_by(mut self, actor: impl Into<String>) -> Self {
        self.requested_by = Some(actor.into());
        self
    }

    pub fn with_cancellation(mut self, cancellation: ImportCancellation) -> Self {
        self.cancellation = cancellation;
        self
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,                     // 批次内行号（从 1 开始）
    pub natural_key: Option<String>,
    pub message: String,
}

// ==========================================
// ImportResult - 导入结果汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,                 // 缺少自然键的行
    pub cancelled: bool,
    pub created_fields: Vec<String>,    // 本批次自动创建的字段定义
    pub errors: Vec<RowError>,
}

impl ImportResult {
    pub fn succeeded(&self) -> usize {
        self.created + self.updated
    }

    /// 已处理行数（成功 + 失败 + 跳过）
    pub fn processed(&self) -> usize {
        self.created + self.updated + self.failed + self.skipped
    }
}

/// 单行处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
    Skipped,
}

/// 导入阶段（日志用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Reading,
    RowLoop,
    Finalizing,
}

impl ImportPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportPhase::Reading => "READING",
            ImportPhase::RowLoop => "ROW_LOOP",
            ImportPhase::Finalizing => "FINALIZING",
        }
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
