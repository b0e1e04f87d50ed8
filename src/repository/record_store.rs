// ==========================================
// 销售询价跟踪系统 - 询价记录 Store Trait
// ==========================================
// 职责: 定义询价记录数据访问接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::enquiry::{Enquiry, EnquiryFilter};
use crate::domain::types::FieldValue;
use crate::repository::error::RepositoryResult;
use std::ops::ControlFlow;

// ==========================================
// RecordStore Trait
// ==========================================
// 用途: 导入管道与模式引擎共用的记录访问接口
// 实现者: EnquiryRepository（使用 rusqlite）
pub trait RecordStore: Send + Sync {
    /// 按条件查询询价记录（按询价日期倒序）
    fn find(&self, filter: &EnquiryFilter) -> RepositoryResult<Vec<Enquiry>>;

    /// 按自然键（询价号）查询
    fn find_one(&self, enquiry_number: &str) -> RepositoryResult<Option<Enquiry>>;

    /// 按自然键插入或整体覆盖
    ///
    /// # 说明
    /// - 已存在时保留 id / created_at / created_by
    /// - dynamic_fields 按传入值整体写入（合并由调用方完成）
    fn upsert(&self, record: &Enquiry) -> RepositoryResult<()>;

    /// 记录总数
    fn count(&self) -> RepositoryResult<usize>;

    /// 统计 dynamic_fields[name] 非空的记录数
    fn count_with_field(&self, name: &str) -> RepositoryResult<usize>;

    /// 游标遍历 dynamic_fields[name] 的所有非空值
    ///
    /// # 参数
    /// - visitor: 返回 ControlFlow::Break 时立即停止读取
    ///
    /// # 返回
    /// - 已交给 visitor 的值个数
    fn scan_field_values(
        &self,
        name: &str,
        visitor: &mut dyn FnMut(FieldValue) -> ControlFlow<()>,
    ) -> RepositoryResult<usize>;

    /// 从所有记录中移除 dynamic_fields[name]，返回受影响记录数
    fn bulk_unset_field(&self, name: &str) -> RepositoryResult<usize>;

    /// 所有记录中出现过的动态字段键（去重、排序）
    fn dynamic_field_keys(&self) -> RepositoryResult<Vec<String>>;
}
