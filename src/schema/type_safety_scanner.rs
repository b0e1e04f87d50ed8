// ==========================================
// 销售询价跟踪系统 - 类型安全扫描器
// ==========================================
// 职责: 变更字段类型前，检查已存储的值能否在新类型下解释
// 红线: 游标逐条读取，遇到第一个不兼容值立即停止
// 说明: 严格检查，与导入时的宽松标准化有意不对称
// ==========================================

use crate::domain::types::{FieldType, FieldValue};
use crate::importer::value_normalizer::{parse_date_text, serial_to_date};
use crate::repository::record_store::RecordStore;
use crate::schema::error::SchemaResult;
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, instrument};

const BOOLEAN_FORMS: [&str; 8] = ["true", "false", "yes", "no", "y", "n", "1", "0"];

// ==========================================
// ScanReport - 扫描结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub safe: bool,
    pub reason: Option<String>,
    pub records_examined: usize, // 含导致失败的那条
}

impl ScanReport {
    fn safe(records_examined: usize) -> Self {
        Self {
            safe: true,
            reason: None,
            records_examined,
        }
    }

    fn unsafe_with(reason: String, records_examined: usize) -> Self {
        Self {
            safe: false,
            reason: Some(reason),
            records_examined,
        }
    }
}

/// 单值兼容性判断
pub fn is_value_compatible(value: &FieldValue, target: FieldType, options: &[String]) -> bool {
    match target {
        FieldType::Text => true,
        FieldType::Number => match value {
            FieldValue::Number(n) => n.is_finite(),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                !trimmed.is_empty() && trimmed.parse::<f64>().map(f64::is_finite).unwrap_or(false)
            }
            FieldValue::Bool(_) | FieldValue::Date(_) => false,
        },
        FieldType::Boolean => match value {
            FieldValue::Bool(_) => true,
            FieldValue::Text(_) | FieldValue::Number(_) => {
                let form = value.to_string().trim().to_lowercase();
                BOOLEAN_FORMS.contains(&form.as_str())
            }
            FieldValue::Date(_) => false,
        },
        FieldType::Date => match value {
            FieldValue::Date(_) => true,
            FieldValue::Number(n) => serial_to_date(*n).is_some(),
            FieldValue::Text(s) => parse_date_text(s).is_some(),
            FieldValue::Bool(_) => false,
        },
        FieldType::Select => {
            let form = value.to_string();
            let form = form.trim();
            options.iter().any(|option| option.trim() == form)
        }
    }
}

// ==========================================
// TypeSafetyScanner
// ==========================================
pub struct TypeSafetyScanner {
    records: Arc<dyn RecordStore>,
}

impl TypeSafetyScanner {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// 扫描 dynamic_fields[field] 的全部非空值
    ///
    /// # 规则
    /// - select 且可选项为空: 直接不安全，不读取记录
    /// - 空白文本跳过，不计数
    /// - text 目标类型总是兼容，但仍遍历计数
    #[instrument(skip(self, options))]
    pub fn scan(
        &self,
        field: &str,
        proposed: FieldType,
        options: &[String],
    ) -> SchemaResult<ScanReport> {
        if proposed == FieldType::Select && options.iter().all(|o| o.trim().is_empty()) {
            return Ok(ScanReport::unsafe_with(
                "select 类型需要非空的可选项".to_string(),
                0,
            ));
        }

        let mut examined = 0usize;
        let mut offending: Option<FieldValue> = None;
        self.records.scan_field_values(field, &mut |value| {
            if value.is_blank() {
                return ControlFlow::Continue(());
            }
            examined += 1;
            if is_value_compatible(&value, proposed, options) {
                ControlFlow::Continue(())
            } else {
                offending = Some(value);
                ControlFlow::Break(())
            }
        })?;

        let report = match offending {
            Some(value) => ScanReport::unsafe_with(
                format!("值 \"{}\" 无法解释为 {}", value, proposed),
                examined,
            ),
            None => ScanReport::safe(examined),
        };
        debug!(field, safe = report.safe, examined = report.records_examined, "类型安全扫描完成");
        Ok(report)
    }
}
