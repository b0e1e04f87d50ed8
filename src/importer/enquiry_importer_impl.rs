// ==========================================
// 销售询价跟踪系统 - 询价导入器实现
// ==========================================
// 职责: 整合导入流程，从原始行到询价记录
// 流程: 自然键 → 规范列解析/标准化/派生 → 动态字段 → 合并或新建
// 红线: 单行失败只记录错误，不中断批次
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::enquiry::{DynamicFields, Enquiry};
use crate::domain::import::{ImportOptions, ImportPhase, ImportResult, RawRow, RowError, RowOutcome};
use crate::domain::types::{
    DepartmentStatus, EnquiryStatus, FieldValue, SUPPLY_SCOPE_NOT_SPECIFIED,
};
use crate::importer::column_resolver::{CanonicalField, ColumnResolver, TieredColumnResolver};
use crate::importer::enquiry_importer_trait::{EnquiryImporter, FileParser};
use crate::importer::error::{ImportError, ImportOutcome};
use crate::importer::field_name::derive_field_name;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::value_normalizer::{parse_days, DefaultValueNormalizer, ValueNormalizer};
use crate::repository::record_store::RecordStore;
use crate::schema::field_registry::FieldRegistry;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 每处理多少行让出一次运行时
const YIELD_EVERY_ROWS: usize = 100;

const DEFAULT_REMARKS: &str = "No remarks";

/// 批次内固定的配置快照
struct BatchSettings {
    max_field_name_length: usize,
    default_sales_rep: String,
}

impl BatchSettings {
    fn load<C: ImportConfigReader>(config: &C) -> ImportOutcome<Self> {
        Ok(Self {
            max_field_name_length: config.max_field_name_length()?,
            default_sales_rep: config.default_sales_rep()?,
        })
    }
}

/// 有效单元格的 trim 文本（缺失/哨兵 → None）
fn text_of(value: Option<&FieldValue>) -> Option<String> {
    value
        .filter(|v| !v.is_sentinel())
        .map(|v| v.to_string().trim().to_string())
        .filter(|s| !s.is_empty())
}

// ==========================================
// EnquiryImporterImpl - 询价导入器实现
// ==========================================
pub struct EnquiryImporterImpl<R, C>
where
    R: RecordStore,
    C: ImportConfigReader,
{
    // 数据访问层
    records: R,

    // 配置读取器
    config: C,

    // 动态字段注册表
    registry: Arc<FieldRegistry>,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    resolver: Box<dyn ColumnResolver>,
    normalizer: Box<dyn ValueNormalizer>,
}

impl<R, C> EnquiryImporterImpl<R, C>
where
    R: RecordStore,
    C: ImportConfigReader,
{
    pub fn new(
        records: R,
        config: C,
        registry: Arc<FieldRegistry>,
        file_parser: Box<dyn FileParser>,
        resolver: Box<dyn ColumnResolver>,
        normalizer: Box<dyn ValueNormalizer>,
    ) -> Self {
        Self {
            records,
            config,
            registry,
            file_parser,
            resolver,
            normalizer,
        }
    }

    /// 使用默认组件（通用文件解析 / 三级表头匹配 / 默认标准化）
    pub fn with_defaults(records: R, config: C, registry: Arc<FieldRegistry>) -> Self {
        Self::new(
            records,
            config,
            registry,
            Box::new(UniversalFileParser),
            Box::new(TieredColumnResolver::default()),
            Box::new(DefaultValueNormalizer),
        )
    }

    fn resolve<'r>(&self, row: &'r RawRow, field: CanonicalField) -> Option<&'r FieldValue> {
        self.resolver.resolve(row, field)
    }

    /// 自然键: 自定义列优先，否则询价号别名
    fn resolve_natural_key(&self, row: &RawRow, options: &ImportOptions) -> Option<String> {
        let value = match options.natural_key_column.as_deref() {
            Some(column) => self.resolver.resolve_aliases(row, &[column]),
            None => self.resolve(row, CanonicalField::EnquiryNumber),
        };
        text_of(value)
    }

    /// 处理单行
    fn import_row(
        &self,
        row_number: usize,
        row: &RawRow,
        options: &ImportOptions,
        settings: &BatchSettings,
        created_fields: &mut Vec<String>,
    ) -> ImportOutcome<RowOutcome> {
        let Some(enquiry_number) = self.resolve_natural_key(row, options) else {
            debug!(row = row_number, "缺少自然键，跳过");
            return Ok(RowOutcome::Skipped);
        };

        let mut incoming = self.build_record(row_number, enquiry_number, row, options, settings)?;
        incoming.dynamic_fields = self.collect_dynamic_fields(row, options, settings, created_fields)?;

        // 与类型变更/字段删除互斥
        let _write_guard = self.registry.record_write_guard()?;
        match self.records.find_one(&incoming.enquiry_number)? {
            Some(mut existing) => {
                existing.merge_import(incoming);
                self.records.upsert(&existing)?;
                Ok(RowOutcome::Updated)
            }
            None => {
                self.records.upsert(&incoming)?;
                Ok(RowOutcome::Created)
            }
        }
    }

    /// 规范列解析 + 标准化 + 派生
    fn build_record(
        &self,
        row_number: usize,
        enquiry_number: String,
        row: &RawRow,
        options: &ImportOptions,
        settings: &BatchSettings,
    ) -> ImportOutcome<Enquiry> {
        let normalizer = self.normalizer.as_ref();

        let date_received = normalizer.normalize_date(self.resolve(row, CanonicalField::DateReceived));
        let date_submitted =
            normalizer.normalize_date(self.resolve(row, CanonicalField::DateSubmitted));
        let activity = normalizer.normalize_activity(self.resolve(row, CanonicalField::Activity));
        let status = normalizer.normalize_status(self.resolve(row, CanonicalField::Status), activity);
        let scope = normalizer.normalize_supply_scope(self.resolve(row, CanonicalField::SupplyScope));
        let rnd_handler_name = text_of(self.resolve(row, CanonicalField::RndHandler));

        let days_required = parse_days(self.resolve(row, CanonicalField::DaysRequired)).map_err(
            |message| ImportError::TypeConversion {
                row: row_number,
                field: CanonicalField::DaysRequired.key().to_string(),
                message,
            },
        )?;

        let now = Utc::now();
        Ok(Enquiry {
            id: Uuid::new_v4().to_string(),
            enquiry_number,
            po_number: text_of(self.resolve(row, CanonicalField::PoNumber)),
            market_type: normalizer
                .normalize_market_segment(self.resolve(row, CanonicalField::MarketType)),
            product_type: normalizer
                .normalize_product_type(self.resolve(row, CanonicalField::ProductType)),
            supply_scope: scope
                .map(|s| s.to_string())
                .unwrap_or_else(|| SUPPLY_SCOPE_NOT_SPECIFIED.to_string()),
            manufacturing_type: scope,
            enquiry_date: date_received.unwrap_or_else(|| now.date_naive()),
            date_received,
            date_submitted,
            closure_date: match status {
                EnquiryStatus::Closed => date_submitted,
                EnquiryStatus::Open => None,
            },
            drawing_status: DepartmentStatus::from_flag(
                normalizer.normalize_boolean(self.resolve(row, CanonicalField::DrawingRequired)),
            ),
            costing_status: DepartmentStatus::from_flag(
                normalizer.normalize_boolean(self.resolve(row, CanonicalField::CostingCompleted)),
            ),
            rnd_status: DepartmentStatus::from_flag(rnd_handler_name.is_some()),
            sales_status: DepartmentStatus::Completed,
            rnd_handler_name,
            sales_rep_name: Some(
                text_of(self.resolve(row, CanonicalField::SalesRep))
                    .unwrap_or_else(|| settings.default_sales_rep.clone()),
            ),
            status,
            activity,
            days_required,
            remarks: text_of(self.resolve(row, CanonicalField::Remarks))
                .unwrap_or_else(|| DEFAULT_REMARKS.to_string()),
            dynamic_fields: DynamicFields::new(),
            created_by: options.requested_by.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// 未被规范列占用的表头 → 动态字段
    ///
    /// # 规则
    /// - 已有定义: 按定义名写入
    /// - 无定义且特权批次: 自动创建 text 字段（标签取原表头）
    /// - 创建失败或非特权: 以派生名保留为孤儿键
    fn collect_dynamic_fields(
        &self,
        row: &RawRow,
        options: &ImportOptions,
        settings: &BatchSettings,
        created_fields: &mut Vec<String>,
    ) -> ImportOutcome<DynamicFields> {
        let mut dynamic = DynamicFields::new();
        for (header, value) in row {
            if value.is_sentinel() || self.resolver.is_consumed(header) {
                continue;
            }
            // 自定义自然键列按与解析相同的级别排除
            if let Some(column) = options.natural_key_column.as_deref() {
                if self.resolver.matches_any(header, &[column]) {
                    continue;
                }
            }
            let Some(name) = derive_field_name(header, settings.max_field_name_length) else {
                continue;
            };

            let stored_name = match self.registry.get(&name)? {
                Some(definition) => definition.name,
                None if options.privileged => {
                    match self.registry.ensure_field(&name, header, options.requested_by.as_deref()) {
                        Ok((definition, created)) => {
                            if created {
                                info!(field = %definition.name, header = %header, "导入时自动创建字段");
                                created_fields.push(definition.name.clone());
                            }
                            definition.name
                        }
                        Err(e) => {
                            warn!(field = %name, error = %e, "自动创建字段失败，按孤儿键保留");
                            name
                        }
                    }
                }
                None => name,
            };
            dynamic.insert(stored_name, value.clone());
        }
        Ok(dynamic)
    }
}

#[async_trait::async_trait]
impl<R, C> EnquiryImporter for EnquiryImporterImpl<R, C>
where
    R: RecordStore + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, rows, options), fields(privileged = options.privileged))]
    async fn import_batch(
        &self,
        rows: Vec<RawRow>,
        options: ImportOptions,
    ) -> ImportOutcome<ImportResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        info!(
            batch_id = %batch_id,
            phase = %ImportPhase::Reading,
            rows = rows.len(),
            "开始导入询价数据"
        );
        let settings = BatchSettings::load(&self.config)?;

        let mut result = ImportResult {
            total: rows.len(),
            ..Default::default()
        };

        debug!(batch_id = %batch_id, phase = %ImportPhase::RowLoop, "逐行处理");
        for (idx, row) in rows.iter().enumerate() {
            if idx > 0 && idx % YIELD_EVERY_ROWS == 0 {
                tokio::task::yield_now().await;
            }
            if options.cancellation.is_cancelled() {
                warn!(batch_id = %batch_id, processed = idx, "导入已取消");
                result.cancelled = true;
                break;
            }

            let row_number = idx + 1;
            match self.import_row(row_number, row, &options, &settings, &mut result.created_fields) {
                Ok(RowOutcome::Created) => result.created += 1,
                Ok(RowOutcome::Updated) => result.updated += 1,
                Ok(RowOutcome::Skipped) => result.skipped += 1,
                Err(e) => {
                    let natural_key = self.resolve_natural_key(row, &options);
                    warn!(row = row_number, key = ?natural_key, error = %e, "行导入失败");
                    result.failed += 1;
                    result.errors.push(RowError {
                        row: row_number,
                        natural_key,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            batch_id = %batch_id,
            phase = %ImportPhase::Finalizing,
            total = result.total,
            created = result.created,
            updated = result.updated,
            failed = result.failed,
            skipped = result.skipped,
            cancelled = result.cancelled,
            created_fields = result.created_fields.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "询价导入完成"
        );
        Ok(result)
    }

    #[instrument(skip(self, file_path, options), fields(file = %file_path.display()))]
    async fn import_file(
        &self,
        file_path: &Path,
        options: ImportOptions,
    ) -> ImportOutcome<ImportResult> {
        let header_row_index = self.config.header_row_index()?;
        info!(phase = %ImportPhase::Reading, header_row_index, "解析导入文件");
        let rows = self.file_parser.parse_to_raw_rows(file_path, header_row_index)?;
        self.import_batch(rows, options).await
    }
}
