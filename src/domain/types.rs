// ==========================================
// 销售询价跟踪系统 - 领域类型定义
// ==========================================
// 职责: 字段类型、动态字段值、询价规范枚举
// 红线: 动态字段值为封闭和类型，兼容性判定必须穷举
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 枚举文本解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无法识别的{kind}取值: {value}")]
pub struct DomainParseError {
    pub kind: &'static str,
    pub value: String,
}

impl DomainParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ==========================================
// 字段类型 (Field Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    Select,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Select => "select",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            "select" => Ok(FieldType::Select),
            _ => Err(DomainParseError::new("字段类型", s)),
        }
    }
}

// ==========================================
// 动态字段值 (Field Value)
// ==========================================
// 表格单元格与 dynamic_fields 共用同一封闭类型
// 序列化格式: {"type": "text", "value": "..."}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// 哨兵值: 空串/纯空白/"-" 视为无数据
    ///
    /// 非有限数（NaN/±inf）无法写入 JSON，同样视为无数据
    pub fn is_sentinel(&self) -> bool {
        match self {
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || trimmed == "-"
            }
            FieldValue::Number(n) => !n.is_finite(),
            FieldValue::Bool(_) | FieldValue::Date(_) => false,
        }
    }

    /// 空白文本（扫描器跳过，不计数）
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// 为询价规范枚举生成 as_str / Display / FromStr
macro_rules! labelled_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    _ => Err(DomainParseError::new($kind, s)),
                }
            }
        }
    };
}

// ==========================================
// 市场类型 (Market Segment)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketSegment {
    Domestic,
    Export,
}

labelled_enum!(MarketSegment, "市场类型", {
    Domestic => "Domestic",
    Export => "Export",
});

// ==========================================
// 询价活动 (Activity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    Quoted,
    Regretted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
}

labelled_enum!(Activity, "询价活动", {
    Quoted => "Quoted",
    Regretted => "Regretted",
    InProgress => "In Progress",
    OnHold => "On Hold",
});

impl Activity {
    /// 已报价/已婉拒视为结案活动
    pub fn implies_closed(&self) -> bool {
        matches!(self, Activity::Quoted | Activity::Regretted)
    }
}

// ==========================================
// 询价状态 (Enquiry Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnquiryStatus {
    Open,
    Closed,
}

labelled_enum!(EnquiryStatus, "询价状态", {
    Open => "Open",
    Closed => "Closed",
});

// ==========================================
// 供货范围 (Supply Scope)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyScope {
    Inhouse,
    Broughtout,
    Both,
}

labelled_enum!(SupplyScope, "供货范围", {
    Inhouse => "Inhouse",
    Broughtout => "Broughtout",
    Both => "Both",
});

/// 供货范围未识别时的展示值
pub const SUPPLY_SCOPE_NOT_SPECIFIED: &str = "Not specified";

// ==========================================
// 产品类型 (Product Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "SP")]
    Sp,
    #[serde(rename = "NSP")]
    Nsp,
    #[serde(rename = "SP+NSP")]
    SpNsp,
}

labelled_enum!(ProductType, "产品类型", {
    Sp => "SP",
    Nsp => "NSP",
    SpNsp => "SP+NSP",
});

// ==========================================
// 部门处理状态 (Department Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepartmentStatus {
    Completed,
    #[serde(rename = "Not Required")]
    NotRequired,
}

labelled_enum!(DepartmentStatus, "部门状态", {
    Completed => "Completed",
    NotRequired => "Not Required",
});

impl DepartmentStatus {
    /// Y/N 标记 → Completed / Not Required
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            DepartmentStatus::Completed
        } else {
            DepartmentStatus::NotRequired
        }
    }
}
