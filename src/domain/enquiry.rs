// ==========================================
// 销售询价跟踪系统 - 询价领域模型
// ==========================================
// 职责: 询价记录（规范属性 + 动态字段）与查询条件
// 红线: dynamic_fields 允许孤儿键，读取时必须原样返回
// ==========================================

use crate::domain::types::{
    Activity, DepartmentStatus, EnquiryStatus, FieldValue, MarketSegment, ProductType,
    SupplyScope,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 动态字段映射（字段名 → 值）
pub type DynamicFields = BTreeMap<String, FieldValue>;

// ==========================================
// Enquiry - 询价记录
// ==========================================
// 对齐: enquiry 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enquiry {
    // ===== 主键 =====
    pub id: String,                          // 记录 ID（UUID）
    pub enquiry_number: String,              // 询价号（自然键）

    // ===== 基础信息 =====
    pub po_number: Option<String>,           // 采购订单号
    pub market_type: MarketSegment,          // 出口 / 内销
    pub product_type: ProductType,           // SP / NSP / SP+NSP
    pub supply_scope: String,                // 供货范围展示值
    pub manufacturing_type: Option<SupplyScope>,

    // ===== 时间信息 =====
    pub enquiry_date: NaiveDate,             // 询价日期（收到日期缺失时取导入日）
    pub date_received: Option<NaiveDate>,
    pub date_submitted: Option<NaiveDate>,   // 提交/报价日期
    pub closure_date: Option<NaiveDate>,     // 结案日期（Closed 时取提交日期）

    // ===== 部门状态 =====
    pub drawing_status: DepartmentStatus,
    pub costing_status: DepartmentStatus,
    pub rnd_status: DepartmentStatus,
    pub sales_status: DepartmentStatus,
    pub rnd_handler_name: Option<String>,
    pub sales_rep_name: Option<String>,

    // ===== 进度 =====
    pub status: EnquiryStatus,
    pub activity: Activity,
    pub days_required: i32,                  // 完成询价所需天数
    pub remarks: String,

    // ===== 动态字段 =====
    pub dynamic_fields: DynamicFields,

    // ===== 审计字段 =====
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enquiry {
    /// 以导入结果覆盖已有记录
    ///
    /// # 规则
    /// - 规范属性整体覆盖；po_number / rnd_handler_name / manufacturing_type /
    ///   closure_date 仅在新值存在时覆盖
    /// - 动态字段逐键合并：新键追加，同名键覆盖，未出现的键保留
    /// - id / created_at / created_by 保持不变
    pub fn merge_import(&mut self, incoming: Enquiry) {
        let Enquiry {
            po_number,
            market_type,
            product_type,
            supply_scope,
            manufacturing_type,
            enquiry_date,
            date_received,
            date_submitted,
            closure_date,
            drawing_status,
            costing_status,
            rnd_status,
            sales_status,
            rnd_handler_name,
            sales_rep_name,
            status,
            activity,
            days_required,
            remarks,
            dynamic_fields,
            updated_at,
            ..
        } = incoming;

        if po_number.is_some() {
            self.po_number = po_number;
        }
        if manufacturing_type.is_some() {
            self.manufacturing_type = manufacturing_type;
        }
        if closure_date.is_some() {
            self.closure_date = closure_date;
        }
        if rnd_handler_name.is_some() {
            self.rnd_handler_name = rnd_handler_name;
        }

        self.market_type = market_type;
        self.product_type = product_type;
        self.supply_scope = supply_scope;
        self.enquiry_date = enquiry_date;
        self.date_received = date_received;
        self.date_submitted = date_submitted;
        self.drawing_status = drawing_status;
        self.costing_status = costing_status;
        self.rnd_status = rnd_status;
        self.sales_status = sales_status;
        self.sales_rep_name = sales_rep_name;
        self.status = status;
        self.activity = activity;
        self.days_required = days_required;
        self.remarks = remarks;
        self.updated_at = updated_at;

        self.dynamic_fields.extend(dynamic_fields);
    }
}

// ==========================================
// EnquiryFilter - 询价查询条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnquiryFilter {
    pub status: Option<EnquiryStatus>,
    pub activity: Option<Activity>,
    pub market_type: Option<MarketSegment>,
    pub start_date: Option<NaiveDate>,       // enquiry_date >=
    pub end_date: Option<NaiveDate>,         // enquiry_date <=
    pub search: Option<String>,              // 询价号模糊匹配（不区分大小写）
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(enquiry_number: &str) -> Enquiry {
        let now = Utc::now();
        Enquiry {
            id: "id-1".to_string(),
            enquiry_number: enquiry_number.to_string(),
            po_number: Some("PO-1".to_string()),
            market_type: MarketSegment::Domestic,
            product_type: ProductType::Sp,
            supply_scope: "Inhouse".to_string(),
            manufacturing_type: Some(SupplyScope::Inhouse),
            enquiry_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            date_received: NaiveDate::from_ymd_opt(2025, 1, 2),
            date_submitted: None,
            closure_date: None,
            drawing_status: DepartmentStatus::NotRequired,
            costing_status: DepartmentStatus::NotRequired,
            rnd_status: DepartmentStatus::NotRequired,
            sales_status: DepartmentStatus::Completed,
            rnd_handler_name: None,
            sales_rep_name: Some("Asha".to_string()),
            status: EnquiryStatus::Open,
            activity: Activity::InProgress,
            days_required: 0,
            remarks: "No remarks".to_string(),
            dynamic_fields: DynamicFields::new(),
            created_by: Some("importer".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_merge_import_keeps_untouched_dynamic_keys() {
        let mut existing = sample("ENQ-1");
        existing
            .dynamic_fields
            .insert("region".to_string(), FieldValue::text("North"));
        existing
            .dynamic_fields
            .insert("customer_tier".to_string(), FieldValue::text("Gold"));

        let mut incoming = sample("ENQ-1");
        incoming.id = "id-2".to_string();
        incoming.activity = Activity::Quoted;
        incoming.status = EnquiryStatus::Closed;
        incoming.po_number = None;
        incoming
            .dynamic_fields
            .insert("region".to_string(), FieldValue::text("South"));
        incoming
            .dynamic_fields
            .insert("plant".to_string(), FieldValue::text("P2"));

        existing.merge_import(incoming);

        assert_eq!(existing.id, "id-1");
        assert_eq!(existing.activity, Activity::Quoted);
        assert_eq!(existing.status, EnquiryStatus::Closed);
        assert_eq!(existing.po_number.as_deref(), Some("PO-1"));
        assert_eq!(existing.dynamic_fields.len(), 3);
        assert_eq!(
            existing.dynamic_fields.get("region"),
            Some(&FieldValue::text("South"))
        );
        assert_eq!(
            existing.dynamic_fields.get("customer_tier"),
            Some(&FieldValue::text("Gold"))
        );
    }
}
