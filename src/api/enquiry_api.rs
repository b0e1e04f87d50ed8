// ==========================================
// 销售询价跟踪系统 - 询价 API
// ==========================================
// 职责: 询价记录查询（动态字段原样返回，含孤儿键）
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::enquiry::{Enquiry, EnquiryFilter};
use crate::repository::record_store::RecordStore;

pub struct EnquiryApi {
    records: Arc<dyn RecordStore>,
}

impl EnquiryApi {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    pub fn list_enquiries(&self, filter: &EnquiryFilter) -> ApiResult<Vec<Enquiry>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(ApiError::InvalidInput(format!(
                    "开始日期 {} 晚于结束日期 {}",
                    start, end
                )));
            }
        }
        Ok(self.records.find(filter)?)
    }

    pub fn get_enquiry(&self, enquiry_number: &str) -> ApiResult<Enquiry> {
        self.records
            .find_one(enquiry_number.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("询价 {} 不存在", enquiry_number)))
    }

    pub fn count_enquiries(&self) -> ApiResult<usize> {
        Ok(self.records.count()?)
    }
}
