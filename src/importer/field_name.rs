// ==========================================
// 销售询价跟踪系统 - 动态字段名派生
// ==========================================
// 规则: 小写 → 空白串转 "_" → & / 串转 "and" → 去除 [a-z0-9_] 以外字符
//       → 合并连续 "_" → 截断到最大长度
// ==========================================

use regex::Regex;
use std::sync::OnceLock;

fn whitespace_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("空白正则为常量"))
}

fn conjunction_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[&/]+").expect("连接符正则为常量"))
}

fn disallowed_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9_]").expect("字符过滤正则为常量"))
}

fn underscore_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_+").expect("下划线正则为常量"))
}

/// 由表头派生动态字段名
///
/// # 返回
/// - None: 规范化后为空（该列丢弃）
pub fn derive_field_name(header: &str, max_len: usize) -> Option<String> {
    let lowered = header.to_lowercase();
    let spaced = whitespace_run().replace_all(&lowered, "_");
    let joined = conjunction_run().replace_all(&spaced, "and");
    let stripped = disallowed_chars().replace_all(&joined, "");
    let collapsed = underscore_run().replace_all(&stripped, "_");

    let name: String = collapsed.chars().take(max_len).collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_field_name_rules() {
        assert_eq!(derive_field_name("Customer Region", 50).as_deref(), Some("customer_region"));
        assert_eq!(derive_field_name("Plant / Site", 50).as_deref(), Some("plant_and_site"));
        assert_eq!(derive_field_name("Cost (INR)", 50).as_deref(), Some("cost_inr"));
        assert_eq!(derive_field_name("  Lead   Time ", 50).as_deref(), Some("_lead_time_"));
        assert_eq!(derive_field_name("A&&B", 50).as_deref(), Some("aandb"));
        assert_eq!(derive_field_name("###", 50), None);
        assert_eq!(derive_field_name("", 50), None);
    }

    #[test]
    fn test_derive_field_name_truncates() {
        let header = "x".repeat(80);
        assert_eq!(derive_field_name(&header, 50).map(|n| n.len()), Some(50));
        assert_eq!(derive_field_name("abcdef", 3).as_deref(), Some("abc"));
    }
}
