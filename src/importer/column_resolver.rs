// ==========================================
// 销售询价跟踪系统 - 表头解析器
// ==========================================
// 职责: 将人工编写的表头解析到规范字段（别名表 + 分级匹配）
// 匹配顺序: 精确 → 忽略大小写 → 归一化（去空白/./-/_//）
// 红线: 哨兵值（""/空白/"-"）视为缺失，继续尝试下一个别名
// ==========================================

use crate::domain::import::RawRow;
use crate::domain::types::FieldValue;

// ==========================================
// CanonicalField - 规范列
// ==========================================
// 对齐: 销售询价跟踪表 16 列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    SrNo,
    EnquiryNumber,
    MarketType,
    PoNumber,
    DateReceived,
    DateSubmitted,
    DrawingRequired,
    CostingCompleted,
    RndHandler,
    SalesRep,
    Status,
    Activity,
    SupplyScope,
    ProductType,
    DaysRequired,
    Remarks,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 16] = [
        CanonicalField::SrNo,
        CanonicalField::EnquiryNumber,
        CanonicalField::MarketType,
        CanonicalField::PoNumber,
        CanonicalField::DateReceived,
        CanonicalField::DateSubmitted,
        CanonicalField::DrawingRequired,
        CanonicalField::CostingCompleted,
        CanonicalField::RndHandler,
        CanonicalField::SalesRep,
        CanonicalField::Status,
        CanonicalField::Activity,
        CanonicalField::SupplyScope,
        CanonicalField::ProductType,
        CanonicalField::DaysRequired,
        CanonicalField::Remarks,
    ];

    /// 系统字段名（system_field 表主键）
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::SrNo => "sr_no",
            CanonicalField::EnquiryNumber => "enquiry_number",
            CanonicalField::MarketType => "market_type",
            CanonicalField::PoNumber => "po_number",
            CanonicalField::DateReceived => "date_received",
            CanonicalField::DateSubmitted => "date_submitted",
            CanonicalField::DrawingRequired => "drawing_status",
            CanonicalField::CostingCompleted => "costing_status",
            CanonicalField::RndHandler => "rnd_handler_name",
            CanonicalField::SalesRep => "sales_rep_name",
            CanonicalField::Status => "status",
            CanonicalField::Activity => "activity",
            CanonicalField::SupplyScope => "supply_scope",
            CanonicalField::ProductType => "product_type",
            CanonicalField::DaysRequired => "days_required",
            CanonicalField::Remarks => "remarks",
        }
    }

    /// 表头别名（按优先级排序）
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::SrNo => &[
                "SR. No.", "SR NO", "SR.No.", "S.No", "Serial No", "Sr No", "Sr.No.", "S. No.",
            ],
            CanonicalField::EnquiryNumber => &[
                "Enq No.", "Enq No", "ENQ NO", "Enquiry No", "Enquiry Number", "EnqNo",
                "Enq.No.", "Enq. No.", "ENQ. NO.", "Enquiry No.",
            ],
            CanonicalField::MarketType => &[
                "EXPORT / DOMESTIC", "EXPORT/DOMESTIC", "Export / Domestic", "Export/Domestic",
                "Market", "Market Type", "MARKET TYPE", "Export Domestic", "Market Segment",
            ],
            CanonicalField::PoNumber => &[
                "PO No.", "PO No", "PONo", "PO NO", "PO Number", "Purchase Order", "PO. No.",
                "P.O. No.", "PO. Number",
            ],
            CanonicalField::DateReceived => &[
                "DATE RECEIVED", "Date Received", "Received Date", "DateReceived",
                "Date. Received", "DATE. RECEIVED", "Enquiry Date", "Date",
            ],
            CanonicalField::DateSubmitted => &[
                "DATE SUBMITTED", "Date Submitted", "Submitted Date", "DateSubmitted",
                "Quotation Date", "Quote Date", "Date. Submitted", "DATE. SUBMITTED",
                "Submission Date",
            ],
            CanonicalField::DrawingRequired => &[
                "DRAWING", "Drawing", "Drawing Status", "Drawing Required", "DrawingRequired",
                "Drawing.",
            ],
            CanonicalField::CostingCompleted => &[
                "COSTING", "Costing", "Costing Status", "Costing Completed", "CostingCompleted",
                "Costing.",
            ],
            CanonicalField::RndHandler => &[
                "R&D", "R & D", "RND", "R&D Handler", "RND Handler", "R&D Person", "Research",
                "R&D.", "R & D.", "RnD",
            ],
            CanonicalField::SalesRep => &[
                "SALES", "Sales", "Sales Representative", "Sales Rep", "SALES REP",
                "Representative", "SALES.", "Sales.", "SALES REPRESENTATIVE", "Sales Person",
            ],
            CanonicalField::Status => &[
                "OPEN / CLOSED", "OPEN/CLOSED", "Open / Closed", "Open/Closed", "STATUS",
                "Enquiry Status", "Status", "OPEN CLOSED",
            ],
            CanonicalField::Activity => &[
                "ACTIVITY", "Activity", "Current Activity", "ActivityStatus", "Activity.",
                "Activity Type",
            ],
            CanonicalField::SupplyScope => &[
                "SCOPE OF SUPPLY", "Scope Of Supply", "Supply Scope", "Scope", "SUPPLY SCOPE",
                "ScopeOfSupply", "SCOPE. OF SUPPLY", "Scope of Supply", "Supply",
            ],
            CanonicalField::ProductType => &[
                "PRODUCT TYPE", "Product Type", "ProductType", "Product", "PRODUCT. TYPE",
                "Product. Type", "Product Category",
            ],
            CanonicalField::DaysRequired => &[
                "DAYS TO COMPLETE ENQUIRY", "Days To Complete Enquiry", "DAYS TO COMPLETE",
                "Days To Complete", "Days Required", "Fulfillment Days", "DaysToComplete",
                "Days to Complete Enquiry", "Days", "DAYS. TO COMPLETE",
                "Days required for fulfillment",
            ],
            CanonicalField::Remarks => &[
                "REMARK", "Remarks", "REMARKS", "Comments", "Notes", "Remark",
                "Closure Reason", "Inquiry Notes",
            ],
        }
    }

    /// 默认展示标签（取首个别名）
    pub fn default_label(&self) -> &'static str {
        self.aliases()[0]
    }
}

// ==========================================
// MatchTier - 匹配级别
// ==========================================
pub trait MatchTier: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, header: &str, alias: &str) -> bool;
}

/// 精确匹配
pub struct ExactTier;

impl MatchTier for ExactTier {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn matches(&self, header: &str, alias: &str) -> bool {
        header == alias
    }
}

/// 忽略大小写
pub struct CaseInsensitiveTier;

impl MatchTier for CaseInsensitiveTier {
    fn name(&self) -> &'static str {
        "case_insensitive"
    }

    fn matches(&self, header: &str, alias: &str) -> bool {
        header.to_lowercase() == alias.to_lowercase()
    }
}

/// 归一化匹配（去掉空白和 . - _ /，忽略大小写）
pub struct NormalizedTier;

impl NormalizedTier {
    pub fn normalize(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '.' | '-' | '_' | '/'))
            .flat_map(char::to_lowercase)
            .collect()
    }
}

impl MatchTier for NormalizedTier {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn matches(&self, header: &str, alias: &str) -> bool {
        let normalized = Self::normalize(header);
        !normalized.is_empty() && normalized == Self::normalize(alias)
    }
}

// ==========================================
// ColumnResolver Trait
// ==========================================
// 实现者: TieredColumnResolver
pub trait ColumnResolver: Send + Sync {
    /// 解析规范字段的首个有效值
    fn resolve<'r>(&self, row: &'r RawRow, field: CanonicalField) -> Option<&'r FieldValue> {
        self.resolve_aliases(row, field.aliases())
    }

    /// 按给定别名列表解析（用于调用方指定的自然键列）
    fn resolve_aliases<'r>(&self, row: &'r RawRow, aliases: &[&str]) -> Option<&'r FieldValue>;

    /// 表头在任一级别下是否匹配给定别名
    fn matches_any(&self, header: &str, aliases: &[&str]) -> bool;

    /// 表头是否被任一规范字段别名占用
    fn is_consumed(&self, header: &str) -> bool {
        CanonicalField::ALL
            .iter()
            .any(|field| self.matches_any(header, field.aliases()))
    }
}

pub struct TieredColumnResolver {
    tiers: Vec<Box<dyn MatchTier>>,
}

impl TieredColumnResolver {
    pub fn new(tiers: Vec<Box<dyn MatchTier>>) -> Self {
        Self { tiers }
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// 某一级别下，按别名顺序查找首个非哨兵值
    ///
    /// 每个别名只检查表格顺序中首个匹配的表头；该表头为哨兵值时直接转到下一个别名，
    /// 同一别名匹配到的后续表头不再检查
    fn resolve_in_tier<'r>(
        tier: &dyn MatchTier,
        row: &'r RawRow,
        aliases: &[&str],
    ) -> Option<&'r FieldValue> {
        aliases.iter().find_map(|alias| {
            row.iter()
                .find(|(header, _)| tier.matches(header, alias))
                .map(|(_, value)| value)
                .filter(|value| !value.is_sentinel())
        })
    }
}

impl Default for TieredColumnResolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ExactTier),
            Box::new(CaseInsensitiveTier),
            Box::new(NormalizedTier),
        ])
    }
}

impl ColumnResolver for TieredColumnResolver {
    fn resolve_aliases<'r>(&self, row: &'r RawRow, aliases: &[&str]) -> Option<&'r FieldValue> {
        self.tiers
            .iter()
            .find_map(|tier| Self::resolve_in_tier(tier.as_ref(), row, aliases))
    }

    fn matches_any(&self, header: &str, aliases: &[&str]) -> bool {
        aliases
            .iter()
            .any(|alias| self.tiers.iter().any(|tier| tier.matches(header, alias)))
    }
}
