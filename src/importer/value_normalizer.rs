// ==========================================
// 销售询价跟踪系统 - 单元格值标准化
// ==========================================
// 职责: 布尔/日期/枚举的宽松标准化（纯函数，永不报错）
// 红线: 标准化只用于导入；字段类型变更的严格检查在 TypeSafetyScanner
// ==========================================

use crate::domain::types::{
    Activity, EnquiryStatus, FieldValue, MarketSegment, ProductType, SupplyScope,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// 最大表格序列号（9999-12-31）
const MAX_SPREADSHEET_SERIAL: f64 = 2_958_465.0;

/// Lotus 1-2-3 虚构的 1900-02-29
const PHANTOM_LEAP_DAY_SERIAL: i64 = 60;

/// 回退日期格式（两位年份在前，避免 %Y 吞掉两位年份）
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%d.%m.%Y",
];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn day_month_year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})$").expect("DD-MM-YYYY 正则为常量")
    })
}

/// 枚举标准化种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    MarketSegment,
    Activity,
    /// 询价状态依赖已解析的活动
    Status(Activity),
    SupplyScope,
    ProductType,
}

/// 枚举标准化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedEnum {
    MarketSegment(MarketSegment),
    Activity(Activity),
    Status(EnquiryStatus),
    SupplyScope(Option<SupplyScope>),
    ProductType(ProductType),
}

// ==========================================
// ValueNormalizer Trait
// ==========================================
// 实现者: DefaultValueNormalizer
// 约定: None 与哨兵值（""/"-"/空白）按“无数据”处理
pub trait ValueNormalizer: Send + Sync {
    /// Y / YES / TRUE / 1（不区分大小写）→ true，其余 → false
    fn normalize_boolean(&self, value: Option<&FieldValue>) -> bool;

    /// 原生日期 / 表格序列号 / DD-MM-YYYY / 常见格式 → 日期
    fn normalize_date(&self, value: Option<&FieldValue>) -> Option<NaiveDate>;

    fn normalize_market_segment(&self, value: Option<&FieldValue>) -> MarketSegment;

    fn normalize_activity(&self, value: Option<&FieldValue>) -> Activity;

    fn normalize_status(&self, value: Option<&FieldValue>, activity: Activity) -> EnquiryStatus;

    fn normalize_supply_scope(&self, value: Option<&FieldValue>) -> Option<SupplyScope>;

    fn normalize_product_type(&self, value: Option<&FieldValue>) -> ProductType;

    /// 按种类分派
    fn normalize_enum(&self, kind: EnumKind, value: Option<&FieldValue>) -> NormalizedEnum {
        match kind {
            EnumKind::MarketSegment => {
                NormalizedEnum::MarketSegment(self.normalize_market_segment(value))
            }
            EnumKind::Activity => NormalizedEnum::Activity(self.normalize_activity(value)),
            EnumKind::Status(activity) => {
                NormalizedEnum::Status(self.normalize_status(value, activity))
            }
            EnumKind::SupplyScope => {
                NormalizedEnum::SupplyScope(self.normalize_supply_scope(value))
            }
            EnumKind::ProductType => {
                NormalizedEnum::ProductType(self.normalize_product_type(value))
            }
        }
    }
}

// ==========================================
// DefaultValueNormalizer
// ==========================================
pub struct DefaultValueNormalizer;

impl DefaultValueNormalizer {
    /// 有效值的大写 trim 文本；缺失/哨兵 → None
    fn upper_text(value: Option<&FieldValue>) -> Option<String> {
        let value = value.filter(|v| !v.is_sentinel())?;
        Some(value.to_string().trim().to_uppercase())
    }
}

impl ValueNormalizer for DefaultValueNormalizer {
    fn normalize_boolean(&self, value: Option<&FieldValue>) -> bool {
        match value {
            Some(FieldValue::Bool(b)) => *b,
            other => matches!(
                Self::upper_text(other).as_deref(),
                Some("Y") | Some("YES") | Some("TRUE") | Some("1")
            ),
        }
    }

    fn normalize_date(&self, value: Option<&FieldValue>) -> Option<NaiveDate> {
        match value? {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Number(n) => serial_to_date(*n),
            FieldValue::Text(s) => parse_date_text(s),
            FieldValue::Bool(_) => None,
        }
    }

    fn normalize_market_segment(&self, value: Option<&FieldValue>) -> MarketSegment {
        match Self::upper_text(value) {
            Some(s) if s.contains("EXPORT") => MarketSegment::Export,
            _ => MarketSegment::Domestic,
        }
    }

    fn normalize_activity(&self, value: Option<&FieldValue>) -> Activity {
        let Some(s) = Self::upper_text(value) else {
            return Activity::InProgress;
        };
        if s.contains("QUOTE") {
            Activity::Quoted
        } else if s.contains("REGRET") {
            Activity::Regretted
        } else if s == "ON HOLD" || s == "HOLD" {
            Activity::OnHold
        } else {
            // IN-HOUSE / INHOUSE 及其余取值
            Activity::InProgress
        }
    }

    fn normalize_status(&self, value: Option<&FieldValue>, activity: Activity) -> EnquiryStatus {
        match Self::upper_text(value).as_deref() {
            Some("CLOSED") | Some("CLOSE") => EnquiryStatus::Closed,
            Some("OPEN") => EnquiryStatus::Open,
            _ if activity.implies_closed() => EnquiryStatus::Closed,
            _ => EnquiryStatus::Open,
        }
    }

    fn normalize_supply_scope(&self, value: Option<&FieldValue>) -> Option<SupplyScope> {
        let s = Self::upper_text(value)?;
        match s.as_str() {
            "IN-HOUSE" | "INHOUSE" | "IN HOUSE" => return Some(SupplyScope::Inhouse),
            "BO" | "BROUGHTOUT" | "BROUGHT OUT" | "BROUGHT-OUT" => {
                return Some(SupplyScope::Broughtout)
            }
            _ => {}
        }

        let in_house = s.contains("IN-HOUSE") || s.contains("IN HOUSE") || s.contains("INHOUSE");
        if (in_house && s.contains("BO")) || s.contains('&') || s.contains("AND") {
            return Some(SupplyScope::Both);
        }
        None
    }

    fn normalize_product_type(&self, value: Option<&FieldValue>) -> ProductType {
        let Some(s) = Self::upper_text(value) else {
            return ProductType::Sp;
        };
        match s.as_str() {
            "SP" => ProductType::Sp,
            "NSP" => ProductType::Nsp,
            _ if (s.contains("SP") && s.contains("NSP")) || s.contains('&') => ProductType::SpNsp,
            _ => ProductType::Sp,
        }
    }
}

// ==========================================
// 表格日期序列号
// ==========================================

fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// 表格序列号 → 日期（1900 日期系统，保留 Lotus 闰年缺陷）
///
/// # 规则
/// - 小数部分（时间）向下取整
/// - 1..=59 以 1899-12-31 为第 0 天，60 视为 1900-02-28，≥61 以 1899-12-30 为第 0 天
/// - 非正数、非有限数、超过 9999-12-31 → None
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let day = serial.floor();
    if !(1.0..=MAX_SPREADSHEET_SERIAL).contains(&day) {
        return None;
    }
    let day = day as i64;
    let epoch = serial_epoch()?;
    match day {
        PHANTOM_LEAP_DAY_SERIAL => NaiveDate::from_ymd_opt(1900, 2, 28),
        d if d < PHANTOM_LEAP_DAY_SERIAL => epoch.checked_add_signed(Duration::days(d + 1)),
        d => epoch.checked_add_signed(Duration::days(d)),
    }
}

/// 日期 → 表格序列号（serial_to_date 的逆运算，1900-01-01 之前返回 None）
pub fn date_to_serial(date: NaiveDate) -> Option<f64> {
    let epoch = serial_epoch()?;
    let days = (date - epoch).num_days();
    if days < 2 {
        return None;
    }
    // 1900-03-01 之前的日期不经过虚构闰日
    if days <= PHANTOM_LEAP_DAY_SERIAL {
        Some((days - 1) as f64)
    } else {
        Some(days as f64)
    }
}

/// 文本日期解析: DD-MM-YYYY 优先，其次常见格式与日期时间
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }

    if let Some(caps) = day_month_year_pattern().captures(s) {
        let day = caps[1].parse::<u32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        let year = caps[3].parse::<i32>().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

// ==========================================
// 规范整数属性转换
// ==========================================

/// 前导整数解析（可选符号 + 数字，忽略其后的内容）
fn parse_leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// 完成询价所需天数
///
/// # 规则
/// - 缺失/哨兵 → 0
/// - 数值截断取整；文本取前导整数（"12 days" → 12）
/// - 负数按 0 处理
///
/// # 返回
/// - Err(message): 无法转换为整数（由调用方记为行错误）
pub fn parse_days(value: Option<&FieldValue>) -> Result<i32, String> {
    let Some(value) = value.filter(|v| !v.is_sentinel()) else {
        return Ok(0);
    };

    let parsed = match value {
        FieldValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        FieldValue::Number(_) => None,
        FieldValue::Text(s) => parse_leading_integer(s),
        FieldValue::Bool(_) | FieldValue::Date(_) => None,
    };

    match parsed {
        Some(days) if days < 0 => Ok(0),
        Some(days) => i32::try_from(days).map_err(|_| format!("天数超出范围: {}", value)),
        None => Err(format!("无法解析为整数天数: {}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::text(s)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_boolean() {
        let n = DefaultValueNormalizer;
        for truthy in ["Y", "yes", " TRUE ", "1"] {
            assert!(n.normalize_boolean(Some(&text(truthy))), "{}", truthy);
        }
        for falsy in ["N", "no", "0", "-", "", "maybe"] {
            assert!(!n.normalize_boolean(Some(&text(falsy))), "{}", falsy);
        }
        assert!(n.normalize_boolean(Some(&FieldValue::Number(1.0))));
        assert!(n.normalize_boolean(Some(&FieldValue::Bool(true))));
        assert!(!n.normalize_boolean(None));
    }

    #[test]
    fn test_serial_conversion_edges() {
        assert_eq!(serial_to_date(1.0), Some(ymd(1900, 1, 1)));
        assert_eq!(serial_to_date(59.0), Some(ymd(1900, 2, 28)));
        assert_eq!(serial_to_date(60.0), Some(ymd(1900, 2, 28)));
        assert_eq!(serial_to_date(61.0), Some(ymd(1900, 3, 1)));
        assert_eq!(serial_to_date(45897.0), Some(ymd(2025, 8, 28)));
        assert_eq!(serial_to_date(45897.75), Some(ymd(2025, 8, 28)));
        assert_eq!(serial_to_date(0.0), None);
        assert_eq!(serial_to_date(-3.0), None);
        assert_eq!(serial_to_date(f64::NAN), None);
        assert_eq!(serial_to_date(3_000_000.0), None);
    }

    #[test]
    fn test_serial_round_trip() {
        for date in [
            ymd(1900, 1, 1),
            ymd(1900, 2, 28),
            ymd(1900, 3, 1),
            ymd(1999, 12, 31),
            ymd(2024, 2, 29),
            ymd(2025, 8, 28),
        ] {
            let serial = date_to_serial(date).unwrap();
            assert_eq!(serial_to_date(serial), Some(date), "{}", date);
        }
    }

    #[test]
    fn test_normalize_date_text_forms() {
        let n = DefaultValueNormalizer;
        assert_eq!(n.normalize_date(Some(&text("28-08-2025"))), Some(ymd(2025, 8, 28)));
        assert_eq!(n.normalize_date(Some(&text("1-2-2024"))), Some(ymd(2024, 2, 1)));
        assert_eq!(n.normalize_date(Some(&text("2025-08-28"))), Some(ymd(2025, 8, 28)));
        assert_eq!(n.normalize_date(Some(&text("08/28/2025"))), Some(ymd(2025, 8, 28)));
        assert_eq!(n.normalize_date(Some(&text("28/08/2025"))), Some(ymd(2025, 8, 28)));
        assert_eq!(n.normalize_date(Some(&text("8/28/25"))), Some(ymd(2025, 8, 28)));
        assert_eq!(n.normalize_date(Some(&text("28-Aug-2025"))), Some(ymd(2025, 8, 28)));
        assert_eq!(
            n.normalize_date(Some(&text("2025-08-28T10:15:00Z"))),
            Some(ymd(2025, 8, 28))
        );
        assert_eq!(n.normalize_date(Some(&text("not a date"))), None);
        assert_eq!(n.normalize_date(Some(&text("-"))), None);
        assert_eq!(n.normalize_date(Some(&FieldValue::Bool(true))), None);
        assert_eq!(n.normalize_date(None), None);
    }

    #[test]
    fn test_normalize_activity_and_status() {
        let n = DefaultValueNormalizer;
        assert_eq!(n.normalize_activity(Some(&text("quoted"))), Activity::Quoted);
        assert_eq!(n.normalize_activity(Some(&text("Re-quote sent"))), Activity::Quoted);
        assert_eq!(n.normalize_activity(Some(&text("REGRETED"))), Activity::Regretted);
        assert_eq!(n.normalize_activity(Some(&text("hold"))), Activity::OnHold);
        assert_eq!(n.normalize_activity(Some(&text("In-House"))), Activity::InProgress);
        assert_eq!(n.normalize_activity(None), Activity::InProgress);

        assert_eq!(
            n.normalize_status(Some(&text("close")), Activity::InProgress),
            EnquiryStatus::Closed
        );
        assert_eq!(
            n.normalize_status(Some(&text("Open")), Activity::Quoted),
            EnquiryStatus::Open
        );
        assert_eq!(n.normalize_status(None, Activity::Regretted), EnquiryStatus::Closed);
        assert_eq!(
            n.normalize_status(Some(&text("pending")), Activity::OnHold),
            EnquiryStatus::Open
        );
    }

    #[test]
    fn test_normalize_scope_product_market() {
        let n = DefaultValueNormalizer;
        assert_eq!(n.normalize_supply_scope(Some(&text("in house"))), Some(SupplyScope::Inhouse));
        assert_eq!(n.normalize_supply_scope(Some(&text("Brought-Out"))), Some(SupplyScope::Broughtout));
        assert_eq!(n.normalize_supply_scope(Some(&text("Inhouse + BO"))), Some(SupplyScope::Both));
        assert_eq!(n.normalize_supply_scope(Some(&text("Fab & Machining"))), Some(SupplyScope::Both));
        assert_eq!(n.normalize_supply_scope(Some(&text("unknown"))), None);
        assert_eq!(n.normalize_supply_scope(Some(&text("-"))), None);

        assert_eq!(n.normalize_product_type(Some(&text("nsp"))), ProductType::Nsp);
        assert_eq!(n.normalize_product_type(Some(&text("SP & NSP"))), ProductType::SpNsp);
        assert_eq!(n.normalize_product_type(Some(&text("widget"))), ProductType::Sp);
        assert_eq!(n.normalize_product_type(None), ProductType::Sp);

        assert_eq!(n.normalize_market_segment(Some(&text("export"))), MarketSegment::Export);
        assert_eq!(n.normalize_market_segment(Some(&text("local"))), MarketSegment::Domestic);
    }

    #[test]
    fn test_normalize_enum_dispatch() {
        let n = DefaultValueNormalizer;
        assert_eq!(
            n.normalize_enum(EnumKind::Status(Activity::Quoted), None),
            NormalizedEnum::Status(EnquiryStatus::Closed)
        );
        assert_eq!(
            n.normalize_enum(EnumKind::ProductType, Some(&text("SP+NSP"))),
            NormalizedEnum::ProductType(ProductType::SpNsp)
        );
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days(None), Ok(0));
        assert_eq!(parse_days(Some(&text("-"))), Ok(0));
        assert_eq!(parse_days(Some(&FieldValue::Number(7.9))), Ok(7));
        assert_eq!(parse_days(Some(&text(" 12 days"))), Ok(12));
        assert_eq!(parse_days(Some(&text("-4"))), Ok(0));
        assert!(parse_days(Some(&text("abc"))).is_err());
        assert!(parse_days(Some(&FieldValue::Bool(true))).is_err());
    }
}
